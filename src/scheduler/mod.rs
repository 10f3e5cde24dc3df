use anyhow::{Context, Result};
use chrono::{DateTime, Local, LocalResult, NaiveDate, NaiveTime, TimeZone};
use std::future::Future;
use tokio::time::{Duration, sleep};
use tracing::{error, info};

const RESCHEDULE_POLL_SECONDS: u64 = 30;

/// Runs `task` once a day at the time returned by `time_provider`. The
/// provider is re-read every poll so config edits apply without a restart.
pub async fn run_daily_scheduler<S, F, Fut>(mut time_provider: S, mut task: F) -> Result<()>
where
    S: FnMut() -> Result<NaiveTime>,
    F: FnMut(NaiveDate) -> Fut,
    Fut: Future<Output = Result<()>>,
{
    let mut last_logged: Option<NaiveTime> = None;

    loop {
        let target = match time_provider() {
            Ok(value) => value,
            Err(error) => {
                error!(error = %error, "failed to load daily job time");
                sleep(Duration::from_secs(RESCHEDULE_POLL_SECONDS)).await;
                continue;
            }
        };

        let delay = match delay_until(target, Local::now()) {
            Ok(value) => value,
            Err(error) => {
                error!(error = %error, time = %target, "could not schedule daily job");
                sleep(Duration::from_secs(RESCHEDULE_POLL_SECONDS)).await;
                continue;
            }
        };

        if last_logged != Some(target) {
            info!(seconds = delay.as_secs(), time = %target, "next daily job scheduled");
            last_logged = Some(target);
        }

        if delay > Duration::from_secs(RESCHEDULE_POLL_SECONDS) {
            sleep(Duration::from_secs(RESCHEDULE_POLL_SECONDS)).await;
            continue;
        }

        sleep(delay).await;

        let date = Local::now().date_naive();
        if let Err(error) = task(date).await {
            error!(error = %error, date = %date, "daily job failed");
        }

        sleep(Duration::from_secs(1)).await;
    }
}

/// Time left until the next occurrence of `target` after `now`.
pub fn delay_until(target: NaiveTime, now: DateTime<Local>) -> Result<Duration> {
    let today = now.date_naive();

    let candidate_today = match Local.from_local_datetime(&today.and_time(target)) {
        LocalResult::Single(datetime) => Some(datetime),
        LocalResult::Ambiguous(earliest, _) => Some(earliest),
        LocalResult::None => None,
    };

    let next_run = match candidate_today {
        Some(datetime) if datetime > now => datetime,
        _ => {
            let tomorrow = today
                .succ_opt()
                .context("No calendar day after today")?;
            Local
                .from_local_datetime(&tomorrow.and_time(target))
                .earliest()
                .context("Failed to convert next execution time")?
        }
    };

    (next_run - now)
        .to_std()
        .context("Failed to compute next execution delay")
}

#[cfg(test)]
mod tests {
    use super::delay_until;
    use chrono::{Local, NaiveTime, TimeZone};

    fn at(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).expect("valid time")
    }

    #[test]
    fn delay_is_later_today_when_time_not_reached() {
        let now = Local
            .with_ymd_and_hms(2024, 1, 10, 20, 0, 0)
            .single()
            .expect("unambiguous local time");

        let delay = delay_until(at(21, 0), now).expect("delay computed");
        assert_eq!(delay.as_secs(), 3600);
    }

    #[test]
    fn delay_rolls_over_to_tomorrow() {
        let now = Local
            .with_ymd_and_hms(2024, 1, 10, 21, 30, 0)
            .single()
            .expect("unambiguous local time");

        let delay = delay_until(at(21, 0), now).expect("delay computed");
        assert_eq!(delay.as_secs(), 23 * 3600 + 30 * 60);
    }

    #[test]
    fn exact_time_schedules_next_day() {
        let now = Local
            .with_ymd_and_hms(2024, 1, 10, 21, 0, 0)
            .single()
            .expect("unambiguous local time");

        let delay = delay_until(at(21, 0), now).expect("delay computed");
        assert_eq!(delay.as_secs(), 24 * 3600);
    }
}
