// demos/blur_window.rs — Interactive GPU blur viewer.
//
// Generates a synthetic test scene, blurs it on the GPU, and shows the
// result in a minifb window. The arrow keys change the radius; each
// change runs a fresh GPU invocation.
//
//   cargo run --example blur_window
//
// This binary plays the role of the external collaborators: it produces
// the input pixels, owns the radius control, and is the display sink. The
// library itself never touches a window.

use minifb::{Key, Window, WindowOptions};

use blurbox::blur::box_blur;
use blurbox::gpu::blur::GpuBoxBlur;
use blurbox::gpu::device::GpuDevice;
use blurbox::image::RgbaImage;

const WIDTH: usize = 480;
const HEIGHT: usize = 320;

fn make_scene() -> RgbaImage {
    let mut img = RgbaImage::new(WIDTH, HEIGHT);
    for y in 0..HEIGHT {
        for x in 0..WIDTH {
            let r = (x * 255 / WIDTH) as u8;
            let g = (y * 255 / HEIGHT) as u8;
            let b = (((x / 24) + (y / 24)) % 2 * 255) as u8;
            img.set(x, y, [r, g, b, 255]);
        }
    }
    img
}

/// Pack RGBA into minifb's 0RGB u32 framebuffer format.
fn to_framebuffer(img: &RgbaImage) -> Vec<u32> {
    (0..HEIGHT)
        .flat_map(|y| (0..WIDTH).map(move |x| (x, y)))
        .map(|(x, y)| {
            let [r, g, b, _] = img.get(x, y);
            (r as u32) << 16 | (g as u32) << 8 | b as u32
        })
        .collect()
}

fn main() {
    let scene = make_scene();

    println!("Initialising GPU...");
    let gpu = match GpuDevice::new() {
        Ok(gpu) => gpu,
        Err(e) => {
            eprintln!("GPU unavailable ({e}); falling back to CPU blur");
            let cpu_scene = scene.clone();
            run_window(move |radius| box_blur(&cpu_scene, radius));
            return;
        }
    };
    println!("GPU: {}", gpu.adapter_info);

    let blur = GpuBoxBlur::new(&gpu);
    run_window(move |radius| {
        blur.blur(&gpu, &scene, radius)
            .expect("GPU blur failed mid-session")
    });
}

fn run_window(mut blur_fn: impl FnMut(u32) -> RgbaImage) {
    let mut window = Window::new(
        "blurbox — up/down: radius, esc: quit",
        WIDTH,
        HEIGHT,
        WindowOptions::default(),
    )
    .expect("failed to open window");
    window.set_target_fps(60);

    let mut radius: u32 = 4;
    let mut dirty = true;
    let mut framebuffer = vec![0u32; WIDTH * HEIGHT];

    while window.is_open() && !window.is_key_down(Key::Escape) {
        if window.is_key_pressed(Key::Up, minifb::KeyRepeat::Yes) {
            radius += 1;
            dirty = true;
        }
        if window.is_key_pressed(Key::Down, minifb::KeyRepeat::Yes) && radius > 0 {
            radius -= 1;
            dirty = true;
        }

        if dirty {
            let start = std::time::Instant::now();
            let out = blur_fn(radius);
            println!("radius {radius}: {:?}", start.elapsed());
            framebuffer = to_framebuffer(&out);
            dirty = false;
        }

        window
            .update_with_buffer(&framebuffer, WIDTH, HEIGHT)
            .expect("window update failed");
    }
}
