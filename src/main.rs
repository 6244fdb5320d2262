fn main() {
    if let Err(err) = svg_scene_renderer::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
