/// Renders the regression test scene in a headless window and saves it as a
/// PNG.
///
/// Build and run with:
/// ```
/// cargo run --example screenshot -- scene.png
/// ```
use opframe::{new_offscreen_window, Ops};
use opframe_test_scenes::{build_main_scene, check_pixels, CANVAS_HEIGHT, CANVAS_WIDTH};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "screenshot.png".to_owned());

    let mut window = new_offscreen_window(CANVAS_WIDTH, CANVAS_HEIGHT)?;
    let mut ops = Ops::new();
    let expectations = build_main_scene(&mut ops);

    window.frame(ops)?;
    let image = window.screenshot()?;
    window.release();

    for failure in check_pixels(&image, &expectations) {
        eprintln!("{failure}");
    }
    image.save(&path)?;
    println!("saved {}x{} screenshot to {path}", image.width(), image.height());
    Ok(())
}
