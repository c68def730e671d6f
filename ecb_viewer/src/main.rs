use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use ecb_vision::{ParallelPipeline, VisionError};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

mod args;
mod viewer;

use args::Args;

fn log_builder(args: &Args) -> env_logger::Builder {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(args.log_level());
    // RUST_LOG, when set, wins over -v.
    builder.parse_default_env();
    builder.format(|buf, record| writeln!(buf, "[{}] {}", record.level(), record.args()));
    builder
}

fn init_logging(args: &Args) {
    log_builder(args).init();
}

async fn run(file: &Path, args: &Args) -> Result<()> {
    // --- 1. Pipeline Initialization ---
    let pipeline = ParallelPipeline::new(args.to_config())?;
    let config = pipeline.pipeline().config();

    // --- 2. Input ---
    let data: Arc<[u8]> = pipeline
        .pipeline()
        .load(file)
        .with_context(|| format!("Could not read {}", file.display()))?
        .into();

    // --- 3. Rendering ---
    let rendering = if pipeline.workers() == 1 {
        pipeline.pipeline().render(&data)?
    } else {
        pipeline.render(Arc::clone(&data)).await?
    };
    if let Some(legend) = &rendering.legend {
        print!("{}", legend);
    }
    println!(
        "Size: ({}, {})",
        rendering.dimensions.width, rendering.dimensions.height
    );

    // --- 4. Output ---
    if config.should_save() {
        let path = pipeline.pipeline().output_path(file, &rendering);
        println!("Saving output into {}", path.display());
        rendering
            .image
            .save(&path)
            .with_context(|| format!("Could not save {}", path.display()))?;
    }
    if !config.dontshow {
        viewer::show(&rendering.image)?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args);

    let Some(file) = args.file.clone() else {
        Args::command().print_help()?;
        return Ok(());
    };

    match run(&file, &args).await {
        Err(err) => match err.downcast_ref::<VisionError>() {
            // Bad options are a usage problem, not a failure.
            Some(VisionError::InvalidConfiguration(message)) => {
                println!("{}", message);
                Ok(())
            }
            _ => Err(err),
        },
        ok => ok,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::LevelFilter;

    #[test]
    fn verbosity_sets_the_logger_level() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        for (flags, level) in [
            (vec!["ecb-viewer"], LevelFilter::Info),
            (vec!["ecb-viewer", "-v"], LevelFilter::Debug),
            (vec!["ecb-viewer", "-vvv"], LevelFilter::Trace),
        ] {
            let args = Args::try_parse_from(flags).unwrap();
            assert_eq!(log_builder(&args).build().filter(), level);
        }
    }
}
