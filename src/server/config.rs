//! Application configuration read from the process environment.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use mockable::Env;
use uuid::Uuid;

use crate::domain::ScheduleConfig;

pub const BIND_ADDR: &str = "BIND_ADDR";
pub const GENERATION_INTERVAL_SECS: &str = "GENERATION_INTERVAL_SECS";
pub const RECONCILE_INTERVAL_SECS: &str = "RECONCILE_INTERVAL_SECS";
pub const JOB_TICK_BUDGET_SECS: &str = "JOB_TICK_BUDGET_SECS";
pub const INSTRUCTOR_IDS: &str = "INSTRUCTOR_IDS";
pub const LESSONS_PER_WEEK: &str = "LESSONS_PER_WEEK";
pub const EXAMS_PER_WEEK: &str = "EXAMS_PER_WEEK";
pub const CANCEL_REFUND_HOURS: &str = "CANCEL_REFUND_HOURS";

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_GENERATION_INTERVAL_SECS: u64 = 3600;
const DEFAULT_RECONCILE_INTERVAL_SECS: u64 = 900;
const DEFAULT_JOB_TICK_BUDGET_SECS: u64 = 10;

/// Configuration failures that should abort startup.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} has invalid value {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// Runtime knobs for the server and its background jobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    /// Cadence of the weekly generation job ticks.
    pub generation_interval: Duration,
    /// Cadence of the lifecycle reconciliation ticks.
    pub reconcile_interval: Duration,
    /// Time budget for one job tick; an overrunning tick is abandoned.
    pub job_tick_budget: Duration,
    /// Instructors the in-process directory serves.
    pub instructor_ids: Vec<Uuid>,
    pub schedule: ScheduleConfig,
}

fn lookup<T: FromStr, E: Env>(env: &E, name: &'static str, default: T) -> Result<T, ConfigError> {
    match env.string(name) {
        None => Ok(default),
        Some(raw) => raw.parse::<T>().map_err(|_| ConfigError::Invalid {
            name,
            value: raw.clone(),
        }),
    }
}

fn lookup_uuid_list<E: Env>(env: &E, name: &'static str) -> Result<Vec<Uuid>, ConfigError> {
    let Some(raw) = env.string(name) else {
        return Ok(Vec::new());
    };
    raw.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(|token| {
            Uuid::parse_str(token).map_err(|_| ConfigError::Invalid {
                name,
                value: token.to_owned(),
            })
        })
        .collect()
}

impl AppConfig {
    /// Read configuration, falling back to defaults for unset variables.
    pub fn from_env<E: Env>(env: &E) -> Result<Self, ConfigError> {
        let defaults = ScheduleConfig::default();
        let bind_default: SocketAddr =
            DEFAULT_BIND_ADDR.parse().map_err(|_| ConfigError::Invalid {
                name: BIND_ADDR,
                value: DEFAULT_BIND_ADDR.to_owned(),
            })?;

        Ok(Self {
            bind_addr: lookup(env, BIND_ADDR, bind_default)?,
            generation_interval: Duration::from_secs(lookup(
                env,
                GENERATION_INTERVAL_SECS,
                DEFAULT_GENERATION_INTERVAL_SECS,
            )?),
            reconcile_interval: Duration::from_secs(lookup(
                env,
                RECONCILE_INTERVAL_SECS,
                DEFAULT_RECONCILE_INTERVAL_SECS,
            )?),
            job_tick_budget: Duration::from_secs(lookup(
                env,
                JOB_TICK_BUDGET_SECS,
                DEFAULT_JOB_TICK_BUDGET_SECS,
            )?),
            instructor_ids: lookup_uuid_list(env, INSTRUCTOR_IDS)?,
            schedule: ScheduleConfig {
                lessons_per_week: lookup(env, LESSONS_PER_WEEK, defaults.lessons_per_week)?,
                exams_per_week: lookup(env, EXAMS_PER_WEEK, defaults.exams_per_week)?,
                cancel_refund_hours: lookup(
                    env,
                    CANCEL_REFUND_HOURS,
                    defaults.cancel_refund_hours,
                )?,
                ..defaults
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use mockable::MockEnv;
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn defaults_apply_when_nothing_is_set() {
        let mut env = MockEnv::new();
        env.expect_string().returning(|_| None);

        let config = AppConfig::from_env(&env).expect("defaults are valid");
        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.generation_interval, Duration::from_secs(3600));
        assert_eq!(config.reconcile_interval, Duration::from_secs(900));
        assert_eq!(config.job_tick_budget, Duration::from_secs(10));
        assert!(config.instructor_ids.is_empty());
        assert_eq!(config.schedule, ScheduleConfig::default());
    }

    #[rstest]
    fn overrides_are_parsed() {
        let mut env = MockEnv::new();
        env.expect_string().returning(|name| match name {
            BIND_ADDR => Some("127.0.0.1:9000".to_owned()),
            GENERATION_INTERVAL_SECS => Some("60".to_owned()),
            LESSONS_PER_WEEK => Some("8".to_owned()),
            _ => None,
        });

        let config = AppConfig::from_env(&env).expect("overrides are valid");
        assert_eq!(config.bind_addr.port(), 9000);
        assert_eq!(config.generation_interval, Duration::from_secs(60));
        assert_eq!(config.schedule.lessons_per_week, 8);
        assert_eq!(
            config.schedule.exams_per_week,
            ScheduleConfig::default().exams_per_week
        );
    }

    #[rstest]
    fn instructor_list_parses_comma_separated_uuids() {
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        let raw = format!("{first}, {second},");
        let mut env = MockEnv::new();
        env.expect_string().returning(move |name| match name {
            INSTRUCTOR_IDS => Some(raw.clone()),
            JOB_TICK_BUDGET_SECS => Some("30".to_owned()),
            _ => None,
        });

        let config = AppConfig::from_env(&env).expect("list is valid");
        assert_eq!(config.instructor_ids, vec![first, second]);
        assert_eq!(config.job_tick_budget, Duration::from_secs(30));
    }

    #[rstest]
    fn malformed_instructor_ids_abort_startup() {
        let mut env = MockEnv::new();
        env.expect_string().returning(|name| match name {
            INSTRUCTOR_IDS => Some("not-a-uuid".to_owned()),
            _ => None,
        });

        let err = AppConfig::from_env(&env).expect_err("rejected");
        assert_eq!(
            err,
            ConfigError::Invalid {
                name: INSTRUCTOR_IDS,
                value: "not-a-uuid".to_owned(),
            }
        );
    }

    #[rstest]
    fn the_process_environment_is_a_usable_source() {
        // DefaultEnv has no unit constructor; Default is the way in.
        let env = mockable::DefaultEnv::default();
        let _ = AppConfig::from_env(&env);
    }

    #[rstest]
    fn malformed_values_abort_startup() {
        let mut env = MockEnv::new();
        env.expect_string().returning(|name| match name {
            RECONCILE_INTERVAL_SECS => Some("soon".to_owned()),
            _ => None,
        });

        let err = AppConfig::from_env(&env).expect_err("rejected");
        assert_eq!(
            err,
            ConfigError::Invalid {
                name: RECONCILE_INTERVAL_SECS,
                value: "soon".to_owned(),
            }
        );
    }
}
