//! CLI command for dumping raw records

use std::path::Path;
use std::time::Instant;

use crate::cli::progress::{PACKAGE, print_done, print_step, simple_bar};

pub fn execute(
    source: &Path,
    destination: &Path,
    stem: &str,
    type_tag: Option<u32>,
    progress: bool,
) -> anyhow::Result<()> {
    let started = Instant::now();
    let archive = super::open_archive(source, stem)?;

    let written = if progress {
        print_step(
            1,
            1,
            PACKAGE,
            &format!("Dumping records to {}...", destination.display()),
        );
        let pb = simple_bar(archive.record_count()? as u64, "Dumping");
        let written = archive.dump(destination, type_tag, &|update| {
            pb.set_position(update.current as u64);
            if let Some(name) = &update.current_item {
                pb.set_message(name.clone());
            }
        })?;
        pb.finish_with_message("done");
        written
    } else {
        archive.dump(destination, type_tag, &|_| {})?
    };

    println!("Dumped {written} records");
    if progress {
        print_done(started.elapsed());
    }
    Ok(())
}
