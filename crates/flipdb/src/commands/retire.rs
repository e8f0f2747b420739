use crate::context::Context;
use colored::Colorize;

pub async fn handle(name: &str, yes: bool) -> anyhow::Result<()> {
    let context = Context::load().await?;

    if !yes {
        let descriptor = context.store().load(name).await?;
        println!(
            "{} {} ({})",
            "Would delete standby instance".yellow(),
            descriptor.previous.instance_identifier.cyan(),
            if descriptor.previous.endpoint.is_empty() {
                "no endpoint recorded"
            } else {
                descriptor.previous.endpoint.as_str()
            }
        );
        println!("Rolling back to it will no longer be possible.");
        println!("Pass --yes to delete it");
        return Ok(());
    }

    let mut orchestrator = context.orchestrator();
    let descriptor = orchestrator.retire(name).await?;

    println!(
        "{} {}",
        "✓ Retired".green().bold(),
        descriptor.previous.instance_identifier.cyan()
    );
    Ok(())
}
