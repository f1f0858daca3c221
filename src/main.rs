use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use pipit::application::{InstallAction, ListAction, NewAction, UninstallAction, UpdateAction};
use pipit::error::PipitError;
use pipit::pip::{PipInstaller, Project, VirtualenvProvisioner};
use pipit::runtime::{RealRuntime, Runtime};

/// pipit - declare and synchronize Python project dependencies.
///
/// Dependencies live in pipit.json next to your code; `pipit install`
/// keeps the isolated environment under .pipit/ in sync with it.
///
/// Examples:
///   pipit new            # Create the environment and an empty manifest
///   pipit install        # Synchronize the environment to the manifest
///   pipit install flask  # Install flask and pin it in the manifest
#[derive(Parser, Debug)]
#[command(author, version = env!("PIPIT_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Project directory (defaults to the current directory; also via PIPIT_PROJECT)
    #[arg(
        long = "project",
        short = 'p',
        env = "PIPIT_PROJECT",
        value_name = "PATH",
        global = true
    )]
    pub project: Option<PathBuf>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Create a new isolated environment and manifest
    New(NewArgs),

    /// Install packages, or synchronize the environment to the manifest
    Install(InstallArgs),

    /// Uninstall packages and drop them from the manifest
    Uninstall(UninstallArgs),

    /// Update installed manifest dependencies to their latest versions
    Update(UpdateArgs),

    /// List installed packages
    List(ListArgs),
}

#[derive(clap::Args, Debug)]
struct NewArgs {
    /// Where to create the project (defaults to the current directory)
    path: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
struct InstallArgs {
    /// Packages to install; with none given, synchronizes the manifest
    #[arg(value_name = "PACKAGES")]
    packages: Vec<String>,

    /// Target the dev-dependencies group
    #[arg(long, short = 'd')]
    dev: bool,
}

#[derive(clap::Args, Debug)]
struct UninstallArgs {
    /// Packages to uninstall
    #[arg(value_name = "PACKAGES", required = true)]
    packages: Vec<String>,
}

#[derive(clap::Args, Debug)]
struct UpdateArgs {
    /// Packages to update; with none given, updates every manifest entry
    #[arg(value_name = "PACKAGES")]
    packages: Vec<String>,
}

#[derive(clap::Args, Debug)]
struct ListArgs {
    /// Only list packages with newer versions available
    #[arg(long, short = 'o')]
    outdated: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let runtime = RealRuntime;

    if let Err(err) = run(cli, &runtime) {
        eprintln!("error: {:#}", err);
        let code = err
            .downcast_ref::<PipitError>()
            .map(PipitError::exit_code)
            .unwrap_or(1);
        std::process::exit(code);
    }
}

fn run(cli: Cli, runtime: &RealRuntime) -> Result<()> {
    match cli.command {
        Commands::New(args) => {
            let provisioner = VirtualenvProvisioner;
            let root = args.path.or(cli.project);
            NewAction::new(runtime, &provisioner).run(root)?;
        }
        Commands::Install(args) => {
            let project = resolve_project(runtime, cli.project)?;
            let installer = PipInstaller::new(project.clone());
            InstallAction::new(runtime, &installer, project).run(&args.packages, args.dev)?;
        }
        Commands::Uninstall(args) => {
            let project = resolve_project(runtime, cli.project)?;
            let installer = PipInstaller::new(project.clone());
            UninstallAction::new(runtime, &installer, project).run(&args.packages)?;
        }
        Commands::Update(args) => {
            let project = resolve_project(runtime, cli.project)?;
            let installer = PipInstaller::new(project.clone());
            UpdateAction::new(runtime, &installer, project).run(&args.packages)?;
        }
        Commands::List(args) => {
            let project = resolve_project(runtime, cli.project)?;
            let installer = PipInstaller::new(project.clone());
            let report =
                ListAction::new(runtime, &installer, project).run(args.outdated)?;
            if report.is_empty() {
                if args.outdated {
                    println!("Everything is up to date.");
                } else {
                    println!("No packages installed.");
                }
            }
            for package in report {
                match package.latest {
                    Some(latest) => {
                        println!("{} {} (latest: {})", package.name, package.version, latest)
                    }
                    None => println!("{} {}", package.name, package.version),
                }
            }
        }
    }
    Ok(())
}

fn resolve_project(runtime: &RealRuntime, root: Option<PathBuf>) -> Result<Project> {
    let root = match root {
        Some(path) => path,
        None => runtime.current_dir()?,
    };
    Ok(Project::new(root))
}
