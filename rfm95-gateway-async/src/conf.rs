use sx127x_async::conf::Config;
use sx127x_async::op::ModemPreset;

/// The tunables of a gateway: where it listens and how.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GatewayConfig {
    /// Carrier frequency in MHz.
    pub frequency_mhz: f64,
    /// Named modem parameter set.
    pub preset: ModemPreset,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            frequency_mhz: 868.0,
            preset: ModemPreset::Default,
        }
    }
}

impl From<&GatewayConfig> for Config {
    fn from(config: &GatewayConfig) -> Self {
        Config {
            frequency_mhz: config.frequency_mhz,
            modem: config.preset.config(),
            ..Config::default()
        }
    }
}
