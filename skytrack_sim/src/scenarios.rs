//! Traffic scenarios for the simulation harness.

/// Scenario identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScenarioId {
    /// SIM-001: Well-behaved traffic at ~1 Hz per aircraft
    SteadyTraffic,

    /// SIM-002: A large share of reports arrive without coordinates
    PartialBursts,

    /// SIM-003: Half the aircraft go silent and must be reaped
    SilentDropout,

    /// SIM-004: Every aircraft reports on every tick
    RateFlood,

    /// SIM-005: Observer pose lost for part of the run
    ObserverLoss,

    /// SIM-006: Session reset halfway through
    SessionReset,
}

impl ScenarioId {
    /// Returns a list of all scenarios.
    pub fn all() -> Vec<ScenarioId> {
        vec![
            ScenarioId::SteadyTraffic,
            ScenarioId::PartialBursts,
            ScenarioId::SilentDropout,
            ScenarioId::RateFlood,
            ScenarioId::ObserverLoss,
            ScenarioId::SessionReset,
        ]
    }

    /// Returns the scenario name.
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioId::SteadyTraffic => "steady_traffic",
            ScenarioId::PartialBursts => "partial_bursts",
            ScenarioId::SilentDropout => "silent_dropout",
            ScenarioId::RateFlood => "rate_flood",
            ScenarioId::ObserverLoss => "observer_loss",
            ScenarioId::SessionReset => "session_reset",
        }
    }

    /// Returns a description of the scenario.
    pub fn description(&self) -> &'static str {
        match self {
            ScenarioId::SteadyTraffic => "1 Hz reports with position noise, targets follow ground truth",
            ScenarioId::PartialBursts => "40% of reports carry no position, no track is born from one",
            ScenarioId::SilentDropout => "Half the fleet goes silent, reaped just after the stale threshold",
            ScenarioId::RateFlood => "Reports every tick, target updates capped by the rate limit",
            ScenarioId::ObserverLoss => "No observer pose for 30% of the run, reports deferred",
            ScenarioId::SessionReset => "Store cleared mid-run, tracks rebuilt from fresh reports",
        }
    }
}

impl std::fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for ScenarioId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "steady_traffic" | "steady" | "sim-001" => Ok(ScenarioId::SteadyTraffic),
            "partial_bursts" | "partial" | "sim-002" => Ok(ScenarioId::PartialBursts),
            "silent_dropout" | "dropout" | "sim-003" => Ok(ScenarioId::SilentDropout),
            "rate_flood" | "flood" | "sim-004" => Ok(ScenarioId::RateFlood),
            "observer_loss" | "sim-005" => Ok(ScenarioId::ObserverLoss),
            "session_reset" | "reset" | "sim-006" => Ok(ScenarioId::SessionReset),
            _ => Err(format!("Unknown scenario: {}", s)),
        }
    }
}
