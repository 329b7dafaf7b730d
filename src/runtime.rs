//! The dispatch loop.
//!
//! One task owns the desk and multiplexes three sources with `select!`: the
//! poll interval, typed input lines and the shutdown token. The interval
//! branch is disabled while the confirmation modal is open, so ticks that
//! would have fired are dropped rather than queued, and the interval restarts
//! from zero when polling resumes.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::app::{Command, OrderDesk};
use crate::console::{parse_input, Input, Presenter};

pub async fn run_loop<P: Presenter>(
    desk: &mut OrderDesk,
    mut lines: mpsc::Receiver<String>,
    presenter: &mut P,
    poll_every: Duration,
    cancel: CancellationToken,
) {
    // The first tick completes immediately.
    let mut ticker = interval(poll_every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!(poll_secs = poll_every.as_secs(), "Order desk loop started");
    loop {
        let was_active = desk.polling_active();
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!("Shutdown requested");
                break;
            }
            _ = ticker.tick(), if desk.polling_active() => {
                for update in desk.dispatch(Command::Tick).await {
                    presenter.render(&update);
                }
            }
            line = lines.recv() => {
                let Some(line) = line else {
                    debug!("Input closed");
                    break;
                };
                match parse_input(&line) {
                    Ok(Input::Command(Command::Quit)) => break,
                    Ok(Input::Command(command)) => {
                        debug!(?command, "Dispatching");
                        for update in desk.dispatch(command).await {
                            presenter.render(&update);
                        }
                    }
                    Ok(Input::Help) => presenter.show_help(),
                    Ok(Input::Blank) => {}
                    Err(message) => presenter.show_error(&message),
                }
            }
        }
        if !was_active && desk.polling_active() {
            ticker.reset();
        }
    }
    info!("Order desk loop stopped");
}
