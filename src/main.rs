//! Tonechain CLI - Chained Photo Adjustments
//!
//! This is a demonstration CLI for the tonechain library.

use anyhow::{bail, Context, Result};
use tonechain::prelude::*;

fn main() {
    env_logger::init();
    println!("🎞  Tonechain - Chained Photo Adjustments v{}", tonechain::VERSION);
    println!();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage(&args[0]);
        return;
    }

    let result = match args[1].as_str() {
        "list" => {
            list_filters();
            Ok(())
        }
        "info" => info(args.get(2).map(String::as_str)),
        "process" => {
            if args.len() < 4 {
                eprintln!("Error: Please specify input and output paths");
                eprintln!(
                    "Usage: {} process <input> <output> [--temperature <kelvin>] [--vibrance <amount>] [--hue <degrees>] [--sharpness <amount>]",
                    args[0]
                );
                return;
            }
            process_image(&args[2..])
        }
        "help" | "--help" | "-h" => {
            print_usage(&args[0]);
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {other}");
            print_usage(&args[0]);
            Ok(())
        }
    };

    if let Err(err) = result {
        eprintln!("❌ {err:#}");
        std::process::exit(1);
    }
}

fn print_usage(program: &str) {
    println!("Usage: {program} <command> [options]");
    println!();
    println!("Commands:");
    println!("  list              List all available adjustments");
    println!("  info <filter>     Show detailed info about an adjustment");
    println!("  process <in> <out> [options]  Process an image");
    println!("  help              Show this help message");
    println!();
    println!("Process options:");
    println!("  --temperature <kelvin>  Target neutral temperature (default: 6500)");
    println!("  --vibrance <amount>     Vibrance boost -1.0 to 1.0 (default: 0)");
    println!("  --hue <degrees>         Hue rotation in degrees (default: 0)");
    println!("  --sharpness <amount>    Sharpening amount (default: 0.4)");
}

fn list_filters() {
    let registry = FilterRegistry::with_builtins();

    println!("Available adjustments ({} total):", registry.len());
    println!();
    for id in registry.ids() {
        // Registry population guarantees the lookup.
        if let Ok(spec) = registry.lookup(id) {
            println!(
                "  • {} — parameter '{}', default {}",
                id,
                spec.parameter(),
                spec.default_value()
            );
        }
    }
}

fn info(name: Option<&str>) -> Result<()> {
    let Some(name) = name else {
        bail!("please specify an adjustment name (try 'list')");
    };

    let registry = FilterRegistry::with_builtins();
    let spec = registry
        .parse(name)
        .with_context(|| format!("no adjustment named '{name}' (try 'list')"))?;

    println!("Adjustment: {}", spec.id());
    println!("Parameter:  {}", spec.parameter());
    println!("Default:    {}", spec.default_value());
    println!("Kind:       {}", spec.default_value().kind());
    println!();
    println!("Slider mapping samples:");
    for sample in [0.0, 0.5, 1.0] {
        println!("  {sample:>5} -> {}", spec.convert(sample));
    }
    Ok(())
}

fn process_image(args: &[String]) -> Result<()> {
    let input_path = &args[0];
    let output_path = &args[1];

    // Parse options
    let mut temperature: Option<f64> = None;
    let mut vibrance: Option<f64> = None;
    let mut hue_degrees: Option<f64> = None;
    let mut sharpness: Option<f64> = None;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--temperature" if i + 1 < args.len() => {
                temperature = args[i + 1].parse().ok();
                i += 2;
            }
            "--vibrance" if i + 1 < args.len() => {
                vibrance = args[i + 1].parse().ok();
                i += 2;
            }
            "--hue" if i + 1 < args.len() => {
                hue_degrees = args[i + 1].parse().ok();
                i += 2;
            }
            "--sharpness" if i + 1 < args.len() => {
                sharpness = args[i + 1].parse().ok();
                i += 2;
            }
            other => {
                eprintln!("Unknown option: {other}");
                i += 1;
            }
        }
    }

    let registry = FilterRegistry::with_builtins();
    let mut chain = FilterChain::builder(&registry)
        .add(AdjustmentId::Temperature)
        .add(AdjustmentId::Vibrance)
        .add(AdjustmentId::Hue)
        .add(AdjustmentId::Sharpness)
        // The baseline render should not sharpen unless asked to.
        .configure(AdjustmentId::Sharpness, 0.0)
        .with_observer(|image| {
            if let Some(image) = image {
                println!("   • rendered {}", image.extent());
            }
        })
        .build()?;

    println!("⚙️  Processing {input_path} -> {output_path}");
    let source =
        Bitmap::open(input_path).with_context(|| format!("cannot open '{input_path}'"))?;
    chain.set_image(Some(source));

    if let Some(kelvin) = temperature {
        chain.update_parameter(AdjustmentId::Temperature, kelvin);
    }
    if let Some(amount) = vibrance {
        chain.update_parameter(AdjustmentId::Vibrance, amount);
    }
    if let Some(degrees) = hue_degrees {
        // The hue stage works in radians.
        chain.update_parameter(AdjustmentId::Hue, degrees.to_radians());
    }
    if let Some(amount) = sharpness {
        chain.update_parameter(AdjustmentId::Sharpness, amount);
    }

    log::debug!(
        "final chain state: {}",
        serde_json::to_string(&chain.snapshot())?
    );

    let processed = chain
        .processed_image()
        .context("no processed image was produced")?;
    processed
        .save(output_path)
        .with_context(|| format!("cannot write '{output_path}'"))?;

    println!("🎉 Image saved to: {output_path}");
    Ok(())
}
