use pixelfire::config::{FireConfig, Variant};

fn main() -> anyhow::Result<()> {
    #[cfg(not(target_arch = "wasm32"))]
    pixelfire::init_native_logging(log::LevelFilter::Info)?;

    // `pixelfire [gpu|cpu-blit]`
    let variant = match std::env::args().nth(1) {
        Some(name) => name.parse::<Variant>()?,
        None => Variant::Gpu,
    };
    pixelfire::run(FireConfig::default().with_variant(variant))
}
