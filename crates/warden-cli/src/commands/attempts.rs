//! Login attempt record commands.

use anyhow::{Context, Result};
use chrono::Utc;
use warden::{
    AttemptStore, AttemptThrottle, FileAttemptStore, Identity, ThrottleState, Warden,
};

use super::ConfigSource;
use crate::style::{self, colors::SemanticStyle};

fn open(source: &ConfigSource) -> Result<(Warden, AttemptThrottle<FileAttemptStore>)> {
    let warden = source.warden()?;
    let store = warden
        .file_store()
        .context("No attempts file configured")?;
    let throttle = warden.throttle(store);
    Ok((warden, throttle))
}

fn describe(state: ThrottleState, threshold: u32) -> String {
    let now = Utc::now();
    match state {
        ThrottleState::Clear => "clear".success(),
        ThrottleState::Warned { fail_count } => format!(
            "{fail_count} failed attempt(s), {} remaining",
            threshold.saturating_sub(fail_count)
        )
        .warning(),
        ThrottleState::Locked { lock_until } => format!(
            "locked until {} ({} min remaining)",
            lock_until.format("%Y-%m-%d %H:%M:%S UTC"),
            warden::remaining_minutes(lock_until, now)
        )
        .error(),
    }
}

/// Show the lockout state of one identity.
pub fn status(source: &ConfigSource, identity: &str) -> Result<()> {
    let (warden, throttle) = open(source)?;
    let identity = Identity::new(identity);

    let state = throttle.status(&identity, Utc::now())?;
    let fail_count = throttle
        .record_of(&identity)?
        .map_or(0, |record| record.fail_count);

    style::print_info_table(&[
        ("Identity", identity.to_string()),
        ("State", describe(state, warden.throttle_config().threshold)),
        ("Stored failures", fail_count.to_string()),
        (
            "Store",
            throttle.store().path().display().to_string(),
        ),
    ]);
    Ok(())
}

/// Remove the record of one identity.
pub fn clear(source: &ConfigSource, identity: &str) -> Result<()> {
    let (_, throttle) = open(source)?;
    let identity = Identity::new(identity);

    if throttle.clear(&identity)? {
        style::print_success(&format!("Cleared attempt record for {identity}"));
    } else {
        println!("{}", format!("No attempt record for {identity}").muted());
    }
    Ok(())
}

/// List every stored record.
pub fn list(source: &ConfigSource) -> Result<()> {
    let (warden, throttle) = open(source)?;
    let now = Utc::now();
    let threshold = warden.throttle_config().threshold;

    let rows: Vec<Vec<String>> = throttle
        .store()
        .list()?
        .into_iter()
        .map(|record| {
            vec![
                record.identity.to_string(),
                record.fail_count.to_string(),
                describe(record.state(now), threshold),
            ]
        })
        .collect();

    style::print_rows(&["Identity", "Failures", "State"], &rows);
    Ok(())
}
