//! Submit a backend job and watch it to a terminal outcome.
//!
//! [`AsyncJobPoller`](poller::AsyncJobPoller) submits a job through a
//! [`JobSubmissionClient`](client::JobSubmissionClient), triggers it once,
//! then polls a [`JobStatusClient`](client::JobStatusClient) on a fixed
//! interval until the backend reports a terminal status, the wall-clock
//! budget runs out, or the caller cancels. Progress is observable as a
//! [`PollSnapshot`](snapshot::PollSnapshot) and as a stream of
//! [`PollerEvent`](events::PollerEvent)s.

pub mod client;
pub mod config;
pub mod events;
pub mod poller;
pub mod snapshot;
