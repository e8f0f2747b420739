use crate::context::Context;
use colored::Colorize;
use flipdb_core::{DeployError, OutcomeKind};

/// Deploy `name`, or roll it back when `rollback` is set
pub async fn handle(name: &str, rollback: bool) -> anyhow::Result<()> {
    let context = Context::load().await?;
    let mut orchestrator = context.orchestrator();

    let (verb, command) = if rollback {
        ("Rolling back", "rollback")
    } else {
        ("Deploying", "deploy")
    };
    println!("{} {}...", verb.blue().bold(), name.cyan());

    let outcome = match orchestrator.run(name, rollback).await {
        Ok(outcome) => outcome,
        Err(e) => {
            if e.is_critical() {
                print_critical_banner(command, name, &e);
            }
            return Err(e.into());
        }
    };

    let descriptor = &outcome.descriptor;
    let headline = match outcome.kind {
        OutcomeKind::Deployed => "✓ Deployed",
        OutcomeKind::RolledBack => "✓ Rolled back",
    };
    println!("{} {}", headline.green().bold(), name.cyan());
    println!(
        "  {} -> {}",
        descriptor.dns.fqdn(),
        descriptor.current.endpoint
    );
    println!(
        "  active:  {} ({})",
        descriptor.current.instance_identifier, descriptor.current.endpoint
    );
    println!(
        "  standby: {} ({})",
        descriptor.previous.instance_identifier, descriptor.previous.endpoint
    );

    if !outcome.dns_confirmed {
        println!();
        println!(
            "{}",
            "⚠ The DNS record did not read back with the new target yet; \
             check it before relying on the switch."
                .yellow()
        );
    }
    Ok(())
}

fn traffic_note(error: &DeployError) -> &'static str {
    match error {
        DeployError::CommitAfterCutover {
            dns_confirmed: false,
            ..
        } => "DNS was updated but did not read back with the new target yet.",
        _ => "Live traffic already follows the new target.",
    }
}

fn print_critical_banner(command: &str, name: &str, error: &DeployError) {
    eprintln!();
    eprintln!("{}", "!!! DNS AND DESCRIPTOR DISAGREE !!!".red().bold());
    eprintln!("{}", error.to_string().red());
    eprintln!(
        "{}",
        format!(
            "{} Re-run `flipdb {} {}` to reconcile the descriptor.",
            traffic_note(error),
            command,
            name
        )
        .red()
    );
    eprintln!();
}
