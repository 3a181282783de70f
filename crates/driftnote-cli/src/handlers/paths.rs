//! `driftnote paths` - show the resolved application directories.

use driftnote_core::{data_root, is_prebuilt_binary, log_dir, resource_root};

pub fn execute() -> anyhow::Result<()> {
    println!(
        "Install mode:  {}",
        if is_prebuilt_binary() { "packaged" } else { "development" }
    );
    println!("Data root:     {}", data_root()?.display());
    println!("Log dir:       {}", log_dir()?.display());
    println!("Resource root: {}", resource_root()?.display());
    Ok(())
}
