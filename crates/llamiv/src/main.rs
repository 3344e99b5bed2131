use llamiv::Application;

fn main() {
    std::process::exit(Application::new().run());
}
