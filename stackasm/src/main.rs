use clap::Parser;
use stackasm::assemble;

#[derive(Parser, Debug)]
#[clap(
    name = "stackasm",
    about = "Assemble a textual method body into a stack-VM instruction listing"
)]
struct AppArgs {
    /// Source file containing one method body.
    input: String,
    /// Also dump the instruction/source-line table.
    #[clap(short, long)]
    lines: bool,
}

fn main() {
    env_logger::init();
    let args = AppArgs::parse();

    let source = match std::fs::read_to_string(&args.input) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("cannot read {}: {err}", args.input);
            std::process::exit(1);
        }
    };

    let method = match assemble(&source) {
        Ok(method) => method,
        Err(err) => {
            eprintln!("{}: {err}", args.input);
            std::process::exit(1);
        }
    };

    print!("{}", method.listing());

    if args.lines {
        println!();
        println!("pos   line  insn");
        for (pos, &id) in method.stream().iter().enumerate() {
            match method.line_of(id) {
                Some(line) => {
                    println!("{pos:<5} {line:<5} {}", method.arena().get(id))
                }
                None => println!("{pos:<5} -     {}", method.arena().get(id)),
            }
        }
    }
}
