#[derive(Clone, unoui::form::FormModel)]
enum Choice {
    Yes,
    No,
}

fn main() {}
