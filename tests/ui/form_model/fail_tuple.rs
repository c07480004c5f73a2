#[derive(Clone, unoui::form::FormModel)]
struct Pair(String, String);

fn main() {}
