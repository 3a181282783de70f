//! `driftnote runtime` - report discovered executables.

use driftnote_core::{ExecutableId, ExecutableLocation};
use driftnote_runtime::ServiceManager;

pub async fn execute(manager: &ServiceManager) -> anyhow::Result<()> {
    let status = manager.discover_runtime().await;

    println!("Runtime executables:");
    for id in ExecutableId::ALL {
        print_location(id, status.location(id));
    }
    Ok(())
}

fn print_location(id: ExecutableId, location: &ExecutableLocation) {
    if location.found {
        let path = location
            .path
            .as_ref()
            .map_or_else(String::new, |p| p.display().to_string());
        match &location.version {
            Some(version) => println!("  {id:<8} {path}  ({version})"),
            None => {
                let detail = location.error.as_deref().unwrap_or("version unknown");
                println!("  {id:<8} {path}  ({detail})");
            }
        }
    } else {
        println!("  {id:<8} not found");
    }
}
