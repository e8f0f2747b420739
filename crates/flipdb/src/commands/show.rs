use crate::context::Context;
use colored::Colorize;

pub async fn handle(name: &str) -> anyhow::Result<()> {
    let context = Context::load().await?;
    let store = context.store();
    let descriptor = store.load(name).await?;
    let (_, active) = descriptor.active_role()?;

    println!(
        "{} {} (s3://{}/{})",
        "Deployment".bold(),
        name.cyan(),
        store.bucket(),
        store.key(name)
    );
    println!(
        "  active:  {} [{}]",
        descriptor.current.instance_identifier.green(),
        active
    );
    println!(
        "  standby: {} [{}]",
        descriptor.previous.instance_identifier,
        active.other()
    );
    if descriptor.rollback_requested {
        println!("  {}", "next deploy will roll back".yellow());
    }
    println!();
    print!("{}", descriptor.masked().to_yaml()?);
    Ok(())
}
