use spdif_bridge::audio::tone::run_self_test;
use spdif_bridge::audio::{HardwareBackend, Supervisor, SupervisorConfig};
use spdif_bridge::config::Settings;
use spdif_bridge::init_tracing;
use spdif_bridge::ui::Cli;
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::new();

    // File settings first, then command line and environment on top
    let settings = Settings::load(&cli.config_path())?;
    let settings = cli.apply(settings);
    if let Err(e) = settings.validate() {
        cli.usage_error(&e.to_string());
    }

    init_tracing(settings.trace);

    let mut backend = HardwareBackend::new(&settings);

    if settings.test_mode {
        run_self_test(&mut backend, &settings.primary_device)?;
        return Ok(());
    }

    let mut supervisor = Supervisor::new(backend, SupervisorConfig::from(&settings));
    supervisor.run()
}
