use prometheus_client::{
    collector::Collector,
    encoding::{DescriptorEncoder, EncodeMetric},
    metrics::{gauge::ConstGauge, MetricType},
    registry::Registry,
};

use super::SharedIndex;

#[derive(Debug)]
struct Instrumented(SharedIndex);

pub fn register(reg: &mut Registry, index: SharedIndex) {
    reg.register_collector(Box::new(Instrumented(index)));
}

impl Collector for Instrumented {
    fn encode(&self, mut encoder: DescriptorEncoder<'_>) -> Result<(), std::fmt::Error> {
        let this = self.0.read();

        let configs_encoder = encoder.encode_descriptor(
            "configs",
            "The number of AuthConfigs in the index",
            None,
            MetricType::Gauge,
        )?;
        ConstGauge::new(this.configs_len() as i64).encode(configs_encoder)?;

        let hosts_encoder = encoder.encode_descriptor(
            "hosts",
            "The number of hosts served by an indexed AuthConfig",
            None,
            MetricType::Gauge,
        )?;
        ConstGauge::new(this.hosts_len() as i64).encode(hosts_encoder)?;

        Ok(())
    }
}
