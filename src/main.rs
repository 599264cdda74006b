use anyhow::Context;
use decal_stage::StageConfig;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("decal_stage=info,wgpu_core=warn,wgpu_hal=warn"),
    )
    .init();

    let mut config = StageConfig::from_env();
    if let Some(root) = std::env::args_os().nth(1) {
        config = config.with_asset_root(root);
    }
    log::info!("asset root: {}", config.asset_root.display());

    decal_stage::run(config).context("decal-stage exited with an error")
}
