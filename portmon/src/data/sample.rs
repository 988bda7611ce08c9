/// One timestamped (temperature, humidity) reading extracted from a line.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// Wall-clock arrival time, formatted `%H:%M:%S`.
    pub timestamp: String,
    pub temperature: f64,
    pub humidity: f64,
}

impl std::fmt::Display for Sample {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} temperature: {} humidity: {}",
            self.timestamp, self.temperature, self.humidity
        )
    }
}
