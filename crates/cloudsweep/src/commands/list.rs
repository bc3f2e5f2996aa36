use crate::Target;
use crate::families;
use colored::Colorize;

/// Run each enumerator once and print what it found
pub async fn handle(target: &Target) -> anyhow::Result<()> {
    let metadata = cloudsweep_config::load_metadata(target.metadata.clone())?;
    let families = families::build(&metadata, &target.credentials())?;

    println!(
        "{}",
        format!("Resources owned by {} ({})", metadata.cluster_name, metadata.infra_id).bold()
    );

    let mut total = 0;
    for family in &families {
        for handler in family.registry.iter() {
            println!();
            println!("{}", format!("■ {} [{}]", handler.kind, family.name).cyan().bold());

            match handler.enumerator.enumerate().await {
                Ok(found) => {
                    let mut items = found.list();
                    items.sort_by(|a, b| a.name.cmp(&b.name));
                    if items.is_empty() {
                        println!("  {}", "(none)".dimmed());
                    }
                    for item in &items {
                        match &item.status {
                            Some(status) => println!("  • {} {} ({})", item.name, item.key.dimmed(), status),
                            None => println!("  • {} {}", item.name, item.key.dimmed()),
                        }
                    }
                    total += items.len();
                }
                Err(e) => println!("  ⚠ {}", e.to_string().red()),
            }
        }
    }

    println!();
    println!("{} resources would be deleted", total.to_string().bold());
    Ok(())
}
