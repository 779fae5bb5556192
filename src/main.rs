use eframe::egui;
use slideshow_item::export::DirectoryExporter;
use slideshow_item::indicator::{ActivityIndicator, SpinnerIndicator};
use slideshow_item::item::failure_of;
use slideshow_item::ui::ItemView;
use slideshow_item::{FileSource, ItemEvent, ItemSettings, ZoomableImageItem};
use std::path::PathBuf;
use std::sync::Arc;

struct SlideshowItemApp {
    item: ZoomableImageItem,
    view: ItemView,
    settings: ItemSettings,
}

impl SlideshowItemApp {
    fn new(cc: &eframe::CreationContext<'_>, path: PathBuf, settings: ItemSettings) -> Self {
        let indicator: Option<Box<dyn ActivityIndicator>> = if settings.show_activity_indicator {
            Some(Box::new(SpinnerIndicator::new()))
        } else {
            None
        };
        let exporter = settings
            .export_dir
            .clone()
            .map(DirectoryExporter::new)
            .or_else(DirectoryExporter::pictures);

        let mut item = ZoomableImageItem::new(
            Arc::new(FileSource::new(path)),
            &settings,
            egui::vec2(1200.0, 800.0),
            indicator,
        );
        if let Some(exporter) = exporter {
            item = item.with_exporter(Arc::new(exporter));
        }
        item.set_repaint_context(cc.egui_ctx.clone());
        item.load_image();

        Self {
            item,
            view: ItemView::new(settings.long_press_secs),
            settings,
        }
    }

    fn handle_keys(&mut self, ctx: &egui::Context) {
        ctx.input(|i| {
            if i.key_pressed(egui::Key::R) {
                self.item.release_image();
            }
            if i.key_pressed(egui::Key::L) {
                self.item.load_image();
            }
            if i.key_pressed(egui::Key::Num0) {
                self.item.zoom_out();
            }
        });
    }
}

impl eframe::App for SlideshowItemApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        for event in self.item.poll() {
            if let Some(error) = failure_of(&event) {
                let status = if error.is_recoverable() {
                    error.user_message()
                } else {
                    error.to_string()
                };
                self.view.set_status(status);
            } else if let ItemEvent::Export(slideshow_item::export::ExportOutcome::Saved(path)) =
                &event
            {
                self.view.set_status(format!("Saved {}", path.display()));
            }
        }
        self.handle_keys(ctx);

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE.fill(egui::Color32::from_rgb(20, 20, 25)))
            .show(ctx, |ui| self.view.show(ui, &mut self.item));
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.settings.save();
    }
}

fn main() -> anyhow::Result<()> {
    let debug = std::env::args().any(|a| a == "--debug");
    slideshow_item::logging::init_tracing(debug);

    let path = std::env::args()
        .skip(1)
        .find(|a| !a.starts_with("--"))
        .map(PathBuf::from)
        .ok_or_else(|| anyhow::anyhow!("usage: slideshow-item [--debug] <image>"))?;
    let settings = ItemSettings::load();

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([320.0, 240.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Slideshow Item",
        native_options,
        Box::new(move |cc| Ok(Box::new(SlideshowItemApp::new(cc, path, settings)))),
    )
    .map_err(|e| anyhow::anyhow!("failed to start viewer: {e}"))
}
