//! Rotating bot presence.

use poise::serenity_prelude as serenity;
use std::time::Duration;
use tracing::debug;

const ROTATION_INTERVAL: Duration = Duration::from_secs(30);
const ACTIVITY_COUNT: usize = 3;

/// Activity shown at a given step of the rotation.
#[must_use]
pub fn activity(step: usize, brand: &str) -> serenity::ActivityData {
    match step % ACTIVITY_COUNT {
        0 => serenity::ActivityData::watching(format!("{brand} tickets")),
        1 => serenity::ActivityData::listening("/ticket open"),
        _ => serenity::ActivityData::playing(brand),
    }
}

/// Starts a background task that changes the presence every 30 seconds.
/// Call once per process; the task lives as long as the client.
pub fn start_rotation(ctx: serenity::Context, brand: String) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(ROTATION_INTERVAL);
        let mut step = 0usize;
        loop {
            interval.tick().await;
            debug!(step, "Rotating presence");
            ctx.set_presence(Some(activity(step, &brand)), serenity::OnlineStatus::Online);
            step = step.wrapping_add(1);
        }
    });
}
