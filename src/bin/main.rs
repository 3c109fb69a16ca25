use std::time::{Duration, Instant};

use accretion_swarm::{FrameClock, FrameView, RenderBridge, Simulation, SimulationConfig};
use cgmath::prelude::*;
use eframe::egui;

const ROTATION_SPEED: f32 = 90.0;
const MOVEMENT_SPEED: f32 = 5.0;
const DRAG_ROTATION: f32 = 0.3;
// Screen-space radius of a size 1.0 sprite one unit from the camera
const POINT_SCALE: f32 = 60.0;

struct Axes {
    pub forward: cgmath::Vector3<f32>,
    pub right: cgmath::Vector3<f32>,
    pub up: cgmath::Vector3<f32>,
}

struct Camera {
    pub position: cgmath::Vector3<f32>,
    pub up: cgmath::Vector3<f32>,
    pub pitch: f32,
    pub yaw: f32,
}

impl Camera {
    fn new(position: cgmath::Vector3<f32>, pitch: f32) -> Self {
        Self {
            position,
            up: cgmath::vec3(0.0, 1.0, 0.0),
            pitch,
            yaw: 0.0,
        }
    }

    fn calculate_axes(&self) -> Axes {
        let yaw_rad = self.yaw.to_radians();
        let pitch_rad = self.pitch.to_radians();

        let forward = cgmath::vec3(
            pitch_rad.cos() * yaw_rad.sin(),
            pitch_rad.sin(),
            -pitch_rad.cos() * yaw_rad.cos(),
        )
        .normalize();

        let right = forward.cross(self.up).normalize();
        let up = right.cross(forward).normalize();

        Axes { forward, right, up }
    }

    fn view_projection(&self, aspect: f32) -> cgmath::Matrix4<f32> {
        let axes = self.calculate_axes();
        let view = cgmath::Matrix4::look_to_rh(
            cgmath::point3(self.position.x, self.position.y, self.position.z),
            axes.forward,
            axes.up,
        );
        let projection = cgmath::perspective(cgmath::Deg(70.0), aspect, 0.05, 500.0);
        projection * view
    }
}

#[derive(Clone, Copy)]
struct Sprite {
    position: cgmath::Vector3<f32>,
    color: [f32; 3],
    size: f32,
    opacity: f32,
}

/// Copy of the swarm taken once per tick; painting reads only this.
#[derive(Default)]
struct SpriteBuffer {
    sprites: Vec<Sprite>,
    uploads: u64,
}

impl RenderBridge for SpriteBuffer {
    fn upload(&mut self, view: &FrameView<'_>) {
        self.sprites.clear();
        self.sprites.extend(view.active_slots().map(|slot| {
            let [x, y, z] = view.position(slot);
            Sprite {
                position: cgmath::vec3(x, y, z),
                color: view.color(slot),
                size: view.sizes[slot],
                opacity: view.opacities[slot],
            }
        }));
        self.uploads += 1;
    }
}

fn to_color32(color: [f32; 3], opacity: f32) -> egui::Color32 {
    // Values above 1.0 are bloom headroom; egui can only saturate
    let channel = |c: f32| (c.clamp(0.0, 1.0) * 255.0) as u8;
    egui::Color32::from_rgba_unmultiplied(
        channel(color[0]),
        channel(color[1]),
        channel(color[2]),
        channel(opacity),
    )
}

struct AccretionViewer {
    simulation: Simulation,
    config: SimulationConfig,
    seed: u64,
    sprites: SpriteBuffer,
    camera: Camera,
    clock: FrameClock,
    paused: bool,
    time_scale: f32,
    update_time: Duration,
}

impl AccretionViewer {
    fn new(simulation: Simulation, config: SimulationConfig, seed: u64) -> Self {
        let distance = config.spawn.max_radius * 1.6;
        Self {
            simulation,
            config,
            seed,
            sprites: SpriteBuffer::default(),
            camera: Camera::new(cgmath::vec3(0.0, distance * 0.35, distance), -19.0),
            clock: FrameClock::new(),
            paused: false,
            time_scale: 1.0,
            update_time: Duration::ZERO,
        }
    }

    fn reseed(&mut self) {
        self.seed = self.seed.wrapping_add(1);
        match Simulation::new(self.config.clone(), self.seed) {
            Ok(simulation) => self.simulation = simulation,
            Err(err) => log::error!("failed to restart swarm: {err}"),
        }
    }

    fn handle_camera_input(&mut self, ctx: &egui::Context, ts: f32) {
        if ctx.wants_keyboard_input() {
            return;
        }
        ctx.input(|i| {
            let axes = self.camera.calculate_axes();

            if i.key_down(egui::Key::W) {
                self.camera.position += axes.forward * MOVEMENT_SPEED * ts;
            }
            if i.key_down(egui::Key::S) {
                self.camera.position -= axes.forward * MOVEMENT_SPEED * ts;
            }
            if i.key_down(egui::Key::A) {
                self.camera.position -= axes.right * MOVEMENT_SPEED * ts;
            }
            if i.key_down(egui::Key::D) {
                self.camera.position += axes.right * MOVEMENT_SPEED * ts;
            }
            if i.key_down(egui::Key::Q) {
                self.camera.position -= axes.up * MOVEMENT_SPEED * ts;
            }
            if i.key_down(egui::Key::E) {
                self.camera.position += axes.up * MOVEMENT_SPEED * ts;
            }

            if i.key_down(egui::Key::ArrowUp) {
                self.camera.pitch += ROTATION_SPEED * ts;
            }
            if i.key_down(egui::Key::ArrowDown) {
                self.camera.pitch -= ROTATION_SPEED * ts;
            }
            if i.key_down(egui::Key::ArrowLeft) {
                self.camera.yaw -= ROTATION_SPEED * ts;
            }
            if i.key_down(egui::Key::ArrowRight) {
                self.camera.yaw += ROTATION_SPEED * ts;
            }

            self.camera.pitch = self.camera.pitch.clamp(-89.9999, 89.9999);
        });
    }

    fn render_ui_panel(&mut self, ui: &mut egui::Ui, frame_time: f32) {
        ui.label(format!("FPS: {:.1}", 1.0 / frame_time.max(1e-6)));
        ui.label(format!("Frame Time: {:.3}ms", frame_time * 1000.0));
        ui.label(format!(
            "Update Time: {:.3}ms",
            self.update_time.as_secs_f64() * 1000.0
        ));
        ui.separator();

        ui.label(format!(
            "Active: {} / {}",
            self.simulation.active_count(),
            self.simulation.capacity()
        ));
        ui.label(format!("Recycled: {}", self.simulation.total_recycled()));
        ui.label(format!("Simulated: {:.1}s", self.simulation.elapsed()));
        ui.label(format!("Uploads: {}", self.sprites.uploads));
        ui.label(format!("Seed: {:#x}", self.seed));
        ui.separator();

        ui.checkbox(&mut self.paused, "Paused");
        ui.horizontal(|ui| {
            ui.label("Time Scale: ");
            ui.add(egui::Slider::new(&mut self.time_scale, 0.0..=3.0));
        });
        if ui.button("Reseed").clicked() {
            self.reseed();
        }
    }

    fn paint(&mut self, ui: &mut egui::Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), egui::Sense::drag());
        if response.dragged() {
            let delta = response.drag_delta();
            self.camera.yaw += delta.x * DRAG_ROTATION;
            self.camera.pitch = (self.camera.pitch - delta.y * DRAG_ROTATION).clamp(-89.9999, 89.9999);
        }

        let view_projection = self.camera.view_projection(rect.width() / rect.height().max(1.0));
        let project = |p: cgmath::Vector3<f32>| {
            let clip = view_projection * p.extend(1.0);
            if clip.w <= 0.0 {
                return None;
            }
            let ndc = clip.truncate() / clip.w;
            if ndc.x.abs() > 1.2 || ndc.y.abs() > 1.2 {
                return None;
            }
            let screen = egui::pos2(
                rect.center().x + ndc.x * rect.width() * 0.5,
                rect.center().y - ndc.y * rect.height() * 0.5,
            );
            Some((screen, clip.w))
        };

        let painter = ui.painter_at(rect);

        let mut points: Vec<_> = self
            .sprites
            .sprites
            .iter()
            .filter_map(|sprite| {
                let (screen, depth) = project(sprite.position)?;
                let radius = (sprite.size * POINT_SCALE / depth).max(0.6);
                Some((depth, screen, radius, to_color32(sprite.color, sprite.opacity)))
            })
            .collect();
        // Far to near so closer sprites land on top
        points.sort_by(|a, b| b.0.total_cmp(&a.0));

        let attractor = project(cgmath::vec3(0.0, 0.0, 0.0));
        let mut attractor_drawn = false;
        for (depth, screen, radius, color) in points {
            if let Some((center, attractor_depth)) = attractor {
                if !attractor_drawn && depth < attractor_depth {
                    self.paint_attractor(&painter, center, attractor_depth);
                    attractor_drawn = true;
                }
            }
            painter.circle_filled(screen, radius, color);
        }
        if let (Some((center, depth)), false) = (attractor, attractor_drawn) {
            self.paint_attractor(&painter, center, depth);
        }
    }

    fn paint_attractor(&self, painter: &egui::Painter, center: egui::Pos2, depth: f32) {
        let radius = self.simulation.inner_radius() * POINT_SCALE * 0.8 / depth;
        painter.circle_filled(center, radius, egui::Color32::BLACK);
        painter.circle_stroke(
            center,
            radius,
            egui::Stroke::new(1.5, egui::Color32::from_rgb(255, 170, 80)),
        );
    }
}

impl eframe::App for AccretionViewer {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let ts = self.clock.delta(Instant::now());

        let start_update = Instant::now();
        if !self.paused {
            self.simulation.tick(ts * self.time_scale);
        }
        self.simulation.publish(&mut self.sprites);
        self.update_time = start_update.elapsed();

        self.handle_camera_input(ctx, ts.min(0.1));

        egui::SidePanel::left("Control Panel").show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                self.render_ui_panel(ui, ts);
                ui.allocate_space(ui.available_size());
            });
        });

        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(egui::Color32::from_rgb(3, 3, 8)))
            .show(ctx, |ui| self.paint(ui));

        ctx.request_repaint();
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = match std::env::args().nth(1) {
        Some(path) => SimulationConfig::load(&path)?,
        None => SimulationConfig::default(),
    };
    let seed = std::env::var("ACCRETION_SEED")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(0x5eed);
    let simulation = Simulation::new(config.clone(), seed)?;

    eframe::run_native(
        "Accretion Swarm",
        eframe::NativeOptions {
            renderer: eframe::Renderer::Wgpu,
            initial_window_size: Some(egui::vec2(1280.0, 800.0)),
            ..Default::default()
        },
        Box::new(move |_cc| Box::new(AccretionViewer::new(simulation, config, seed))),
    )
    .map_err(|err| anyhow::anyhow!("viewer exited with an error: {err:?}"))?;

    Ok(())
}
