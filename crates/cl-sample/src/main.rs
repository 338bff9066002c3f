use std::{path::PathBuf, process::ExitCode};

use clap::{Args, Parser, Subcommand};
use log::error;

use cl_sample::{
    enumerate_devices, enumerate_platforms, run, DeviceKind, OpenCl, SampleConfig,
    DEFAULT_ELEMENTS, DEFAULT_KERNEL_NAME, DEFAULT_KERNEL_PATH,
};

#[derive(Parser, Debug)]
#[command(name = "cl-sample", version, about = "OpenCL platform, device and dispatch tutorials")]
struct Cli {
    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Count the available platforms
    Platforms,

    /// List the devices of every platform
    Devices {
        #[arg(long, value_enum, default_value_t = DeviceKind::All)]
        device_type: DeviceKind,
    },

    /// Build the kernel and run it once over two buffers
    Run(RunArgs),
}

#[derive(Args, Debug)]
struct RunArgs {
    #[arg(long, default_value_t = 0)]
    platform: usize,

    #[arg(long, default_value_t = 0)]
    device: usize,

    #[arg(long, value_enum, default_value_t = DeviceKind::Gpu)]
    device_type: DeviceKind,

    /// Elements per buffer
    #[arg(short = 'n', long, default_value_t = DEFAULT_ELEMENTS)]
    elements: usize,

    #[arg(long, value_name = "FILE", default_value = DEFAULT_KERNEL_PATH)]
    kernel: PathBuf,

    #[arg(long, default_value = DEFAULT_KERNEL_NAME)]
    kernel_name: String,

    #[arg(long, default_value = "", allow_hyphen_values = true)]
    build_options: String,

    /// Skip reading the output buffer back
    #[arg(long)]
    no_read_back: bool,
}

impl From<RunArgs> for SampleConfig {
    fn from(args: RunArgs) -> Self {
        SampleConfig {
            platform_index: args.platform,
            device_index: args.device,
            device_kind: args.device_type,
            elements: args.elements,
            kernel_path: args.kernel,
            kernel_name: args.kernel_name,
            build_options: args.build_options,
            read_back: !args.no_read_back,
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn execute(command: Command) -> cl_sample::Result<()> {
    let rt = OpenCl;
    match command {
        Command::Platforms => {
            let platforms = enumerate_platforms(&rt)?;
            println!("Platform Number: {}", platforms.len());
            for (i, p) in platforms.iter().enumerate() {
                println!("  [{i}] {} ({}) {}", p.name, p.vendor, p.version);
            }
        }
        Command::Devices { device_type } => {
            for (i, listing) in enumerate_devices(&rt, device_type)?.iter().enumerate() {
                println!("Platform [{i}] {}", listing.info.name);
                for (j, d) in listing.devices.iter().enumerate() {
                    println!(
                        "  Device [{j}] {} ({}) compute units={} global mem={} MiB",
                        d.name, d.vendor, d.compute_units, d.global_mem_bytes / 1024 / 1024
                    );
                }
            }
        }
        Command::Run(args) => {
            let cfg = SampleConfig::from(args);
            let report = run(&rt, &cfg)?;
            if report.verified {
                println!("{} OK on {}, first elements = {:?}",
                         cfg.kernel_name, report.device.name, report.head);
            } else {
                println!("{} dispatched on {} ({} elements, no read-back)",
                         cfg.kernel_name, report.device.name, report.elements);
            }
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = execute(cli.command);

    #[cfg(feature = "metrics")]
    cl_sample::summary();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}
