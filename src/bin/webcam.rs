//! Webcam viewer: outlines the face and puts a sprite on its forehead.
//!
//! Expects `shape_predictor_68_face_landmarks.dat`, `seeta_fd_frontal_v1.0.bin`
//! and `turd.png` in the working directory. Press any key in the window to
//! quit.

use std::process::ExitCode;
use std::time::Duration;

use browmark::camera::Webcam;
use browmark::dlib::MODEL_68_URL;
use browmark::{
    load_landmark_model, Config, Error, FrameReport, Pipeline, SeetaFaceLocator, Session,
    ShapePredictor,
};
use eframe::egui;
use tracing::{debug, info, Level};

type WebcamSession = Session<Webcam, SeetaFaceLocator, ShapePredictor>;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let config = Config::default();

    let camera = match Webcam::open(config.camera_index) {
        Ok(camera) => camera,
        Err(e) => {
            debug!("{}", e);
            return ExitCode::from(255);
        }
    };

    let estimator = match load_landmark_model(&config.landmark_model) {
        Ok(model) => model,
        Err(e) => {
            eprintln!("You need dlib's default face landmarking model file to run this example.");
            eprintln!("You can get it from the following URL: ");
            eprintln!("   {}", MODEL_68_URL);
            eprintln!();
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    info!(path = %config.landmark_model.display(), "landmark model loaded");

    if let Err(e) = run(&config, camera, estimator) {
        eprintln!("{}", e);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

fn run(config: &Config, camera: Webcam, estimator: ShapePredictor) -> Result<(), Error> {
    let locator = SeetaFaceLocator::load(&config.detector_model, &config.detector)?;
    info!(path = %config.detector_model.display(), "face detector loaded");

    let sprite = image::open(&config.sprite)?.to_rgb8();
    info!(
        path = %config.sprite.display(),
        width = sprite.width(),
        height = sprite.height(),
        "sprite loaded"
    );

    let session = Session::new(
        camera,
        Pipeline::new(locator, estimator, sprite),
        config.frame_scale,
    );
    let app = OverlayApp {
        session,
        texture: None,
        poll_interval: config.key_poll_interval,
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(config.window_title.as_str())
            .with_inner_size([640.0, 480.0]),
        ..Default::default()
    };
    eframe::run_native(
        &config.window_title,
        options,
        Box::new(move |_cc| Ok(Box::new(app))),
    )
    .map_err(|e| Error::Gui(e.to_string()))
}

struct OverlayApp {
    session: WebcamSession,
    texture: Option<egui::TextureHandle>,
    poll_interval: Duration,
}

impl OverlayApp {
    fn show_frame(&mut self, ctx: &egui::Context, frame: &image::RgbImage) {
        let size = [frame.width() as usize, frame.height() as usize];
        let image = egui::ColorImage::from_rgb(size, frame.as_raw());

        match &mut self.texture {
            Some(texture) => texture.set(image, egui::TextureOptions::default()),
            None => {
                self.texture = Some(ctx.load_texture("frame", image, Default::default()));
            }
        }
    }
}

impl eframe::App for OverlayApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let key_pressed = ctx.input(|i| {
            i.events
                .iter()
                .any(|e| matches!(e, egui::Event::Key { pressed: true, .. }))
        });
        if key_pressed {
            info!("key pressed, closing");
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
            return;
        }

        if let Some((frame, report)) = self.session.tick() {
            if let FrameReport::Decorated { face, sprite_drawn } = report {
                debug!(?face, sprite_drawn, "frame decorated");
            }
            self.show_frame(ctx, &frame);
        }

        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| {
                if let Some(ref texture) = self.texture {
                    let available = ui.available_size();
                    let size = texture.size_vec2();
                    let scale = (available.x / size.x).min(available.y / size.y);
                    ui.centered_and_justified(|ui| {
                        ui.image((texture.id(), size * scale));
                    });
                }
            });

        ctx.request_repaint_after(self.poll_interval);
    }
}
