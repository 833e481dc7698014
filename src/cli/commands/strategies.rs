//! List strategies command.

use anyhow::Result;
use chartdesk_strategies::StrategyRegistry;

pub fn run() -> Result<()> {
    let registry = StrategyRegistry::new();

    println!("Available Strategies");
    println!("═══════════════════════════════════════════════════════════");
    println!();

    for info in registry.list() {
        println!("  {} ({})", info.name, info.id);
        println!("  ───────────────────────────────────────────────────────");
        println!("  {}", info.description);
        if info.parameters.is_empty() {
            println!("  Parameters: none");
        } else {
            let parameters: Vec<String> = info
                .parameters
                .iter()
                .map(|(name, value)| format!("{}={}", name, value))
                .collect();
            println!("  Parameters: {}", parameters.join(", "));
        }
        println!();
    }

    println!("Use --strategy <id> to select a strategy and --param name=value to override a parameter.");
    println!();
    println!("Strategy ids: {}", registry.ids().join(", "));

    Ok(())
}
