use afl::fuzz;

fn main() {
    fuzz!(|data: &[u8]| {
        if let Ok(input) = std::str::from_utf8(data) {
            if let Ok(tokens) = romforge::script::lex(input) {
                let _ = romforge::script::Parser::parse(&tokens);
            }
        }
    });
}
