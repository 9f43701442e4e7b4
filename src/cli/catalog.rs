//! `lexforge catalog`

use anyhow::Result;
use lexforge_core::LexforgeConfig;

/// Print every catalog entry with its headline figures
pub fn run(config: &LexforgeConfig) -> Result<()> {
    let catalog = config.build_catalog()?;

    println!(
        "{:<32} {:>7} {:>10} {:>9} {:>12} {:>12}  SPECIALIZATIONS",
        "MODEL", "QUALITY", "LATENCY", "RELIAB.", "IN/1K", "OUT/1K"
    );
    for entry in catalog.entries() {
        println!(
            "{:<32} {:>7.1} {:>8.0}ms {:>9.2} {:>12.6} {:>12.6}  {}",
            entry.id(),
            entry.quality_rating,
            entry.performance.avg_latency_ms,
            entry.performance.reliability,
            entry.pricing.input_per_1k,
            entry.pricing.output_per_1k,
            entry.capabilities.specializations.join(", ")
        );
    }
    println!();
    println!("locale: {}", config.router.locale);
    Ok(())
}
