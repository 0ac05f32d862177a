use std::fs;
use std::path::{Path, PathBuf};

use romforge::{CompileError, CompileOptions, MemoryMap, ProjectInput, compile_project};

const VERSION: &str = env!("CARGO_PKG_VERSION");

struct Args {
    project: PathBuf,
    binary: PathBuf,
    inc: PathBuf,
}

fn main() {
    env_logger::init();

    let args = std::env::args().collect::<Vec<String>>();

    // Handle flags
    if args.len() == 2 {
        match args[1].as_str() {
            "--version" | "-v" => {
                println!("romforge {}", VERSION);
                return;
            }
            "--help" | "-h" => {
                print_usage(&args[0]);
                return;
            }
            _ => {}
        }
    }

    let Some(args) = parse_args(&args) else {
        print_usage(&args[0]);
        std::process::exit(1);
    };

    if let Err(e) = run(&args) {
        match e {
            CompileError::Validation(errors) => {
                eprint!("{}", errors);
                eprintln!("error: compilation failed with {} error(s)", errors.error_count());
            }
            e => eprintln!("error: {}", e),
        }
        std::process::exit(1);
    }
}

fn parse_args(args: &[String]) -> Option<Args> {
    let mut project = None;
    let mut binary = None;
    let mut inc = None;

    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-o" => binary = Some(PathBuf::from(iter.next()?)),
            "-i" => inc = Some(PathBuf::from(iter.next()?)),
            a if a.starts_with('-') => return None,
            a => {
                if project.replace(PathBuf::from(a)).is_some() {
                    return None;
                }
            }
        }
    }

    let project: PathBuf = project?;
    let binary = binary.unwrap_or_else(|| project.with_extension("bin"));
    let inc = inc.unwrap_or_else(|| project.with_extension("inc"));

    Some(Args {
        project,
        binary,
        inc,
    })
}

fn run(args: &Args) -> Result<(), CompileError> {
    let mut input = ProjectInput::load(&args.project)?;
    if input.memory_map.is_none() {
        input.memory_map = Some(MemoryMap::load_or_default());
    }

    // The include file references the binary relative to its own directory
    let binary_path = relative_to(&args.binary, args.inc.parent());
    let options = CompileOptions { binary_path };

    let rom = compile_project(&input, &options)?;

    for warning in rom.warnings.iter() {
        eprintln!("{}", warning);
    }

    write(&args.binary, &rom.binary)?;
    write(&args.inc, rom.inc_data.as_bytes())?;

    Ok(())
}

fn relative_to(path: &Path, base: Option<&Path>) -> String {
    base.and_then(|b| path.strip_prefix(b).ok())
        .unwrap_or(path)
        .display()
        .to_string()
}

fn write(path: &Path, data: &[u8]) -> Result<(), CompileError> {
    fs::write(path, data)
        .map_err(|e| CompileError::Io(format!("could not write to {}: {}", path.display(), e)))
}

fn print_usage(program: &str) {
    eprintln!("Usage: {} <project.toml> [-o <out.bin>] [-i <out.inc>]", program);
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -o <file>        Binary output (default: <project>.bin)");
    eprintln!("  -i <file>        Include file output (default: <project>.inc)");
    eprintln!("  -h, --help       Print this help message");
    eprintln!("  -v, --version    Print version information");
    eprintln!();
    eprintln!("Set RUST_LOG=info (or debug) for progress output.");
}
