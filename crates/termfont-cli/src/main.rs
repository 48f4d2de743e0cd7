fn main() {
    termfont_cli::main();
}
