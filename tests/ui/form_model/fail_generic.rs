#[derive(Clone, unoui::form::FormModel)]
struct Wrapper<T> {
    value: T,
}

fn main() {}
