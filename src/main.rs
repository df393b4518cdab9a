/// pinmap demo entry point for native builds.
///
/// Replays a short editing session against the in-memory store and logs
/// what happens. Pass an image path to use its real dimensions.
#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use pinmap::AppConfig;

    let config = AppConfig::load_from_default_path().unwrap_or_default();

    env_logger::Builder::new()
        .filter_level(config.preferences.log_level.to_level_filter())
        .parse_default_env()
        .init();
    log::info!(
        "{} starting with log level {}",
        config.app_name,
        config.preferences.log_level.name()
    );

    if let Err(e) = demo::run(&config, std::env::args().nth(1)) {
        log::error!("Demo failed: {}", e);
        std::process::exit(1);
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use pinmap::message::{Modifiers, PointerId, PointerInput};
    use pinmap::{
        AppConfig, InputEvent, MapApp, MemoryPinStore, Mode, PercentPoint, Pin, PinId, Point, Size,
        StoreError, StoreRequest, Timestamp, execute,
    };

    const FALLBACK_IMAGE: Size = Size {
        width: 1600.0,
        height: 900.0,
    };
    const CONTAINER: Size = Size {
        width: 800.0,
        height: 600.0,
    };
    const MOUSE: PointerId = PointerId(1);

    fn image_size(path: Option<String>) -> Size {
        let Some(path) = path else {
            return FALLBACK_IMAGE;
        };
        match image::image_dimensions(&path) {
            Ok((width, height)) => {
                log::info!("Using {}x{} from {}", width, height, path);
                Size::new(f64::from(width), f64::from(height))
            }
            Err(e) => {
                log::warn!("Could not read image {}: {} - using {:?}", path, e, FALLBACK_IMAGE);
                FALLBACK_IMAGE
            }
        }
    }

    fn seed() -> Vec<Pin> {
        vec![
            Pin::new(PinId::new("pin-tomato"), PercentPoint::new(30.0, 40.0), "Tomato", "vegetable")
                .with_watering_interval(Some(2)),
            Pin::new(PinId::new("pin-olive"), PercentPoint::new(70.0, 55.0), "Olive", "tree"),
        ]
    }

    struct Session<'a> {
        app: MapApp,
        store: &'a MemoryPinStore,
    }

    impl Session<'_> {
        fn send(&mut self, event: InputEvent) -> Result<(), StoreError> {
            match self.app.update(event) {
                Some(request) => self.run(request),
                None => Ok(()),
            }
        }

        fn run(&mut self, request: StoreRequest) -> Result<(), StoreError> {
            log::debug!("Running {} request {:?}", request.op.name(), request.id);
            let completion = pollster::block_on(execute(self.store, request));
            self.app.apply(completion)
        }

        fn settle(&mut self) {
            while self.app.wants_frame() {
                self.app.update(InputEvent::Frame);
            }
        }

        fn screen_of(&self, pin_id: &PinId) -> Option<Point> {
            self.app.overlay().into_iter().find(|v| &v.id == pin_id).map(|v| v.screen)
        }
    }

    pub fn run(config: &AppConfig, image_path: Option<String>) -> Result<(), StoreError> {
        let map_id = config.preferences.map_id.clone();
        let store = MemoryPinStore::with_pins(&map_id, seed());
        let mut session = Session {
            app: MapApp::new(map_id, config),
            store: &store,
        };

        session.app.viewport_mut().subscribe(|change| {
            log::trace!(
                "Transform: scale {:.4}, offset ({:.1}, {:.1})",
                change.transform.scale,
                change.transform.offset.x,
                change.transform.offset.y
            );
        });

        session.send(InputEvent::Resized(CONTAINER))?;
        session.send(InputEvent::ImageLoaded(image_size(image_path)))?;
        let load = session.app.start();
        session.run(load)?;

        // Zoom in around the middle of the view
        session.send(InputEvent::Wheel {
            delta: -400.0,
            position: Point::new(400.0, 300.0),
        })?;
        session.settle();
        log::info!("Zoomed to {:.3}", session.app.viewport().transform().scale);

        // Drag the tomato a little to the right
        session.app.set_mode(Mode::Edit);
        let tomato = PinId::new("pin-tomato");
        if let Some(start) = session.screen_of(&tomato) {
            let pointer = |x: f64| PointerInput::new(MOUSE, Point::new(x, start.y));
            session.send(InputEvent::PointerDown(pointer(start.x)))?;
            for dx in [2.0, 10.0, 25.0, 40.0] {
                session.send(InputEvent::PointerMove(pointer(start.x + dx)))?;
            }
            session.send(InputEvent::PointerUp(pointer(start.x + 40.0)))?;
        }

        // Place a new pin with the placement modifier
        let placement = Modifiers::NONE.with(config.markers.placement_modifier);
        let click = PointerInput::new(MOUSE, Point::new(200.0, 150.0)).with_modifiers(placement);
        session.send(InputEvent::PointerDown(click))?;
        session.send(InputEvent::PointerUp(click))?;

        if let Some(request) = session.app.mark_watered(&tomato) {
            session.run(request)?;
        }

        let now = Timestamp::now();
        for pin in session.app.board().pins() {
            let label = session
                .app
                .watering_label(&pin.id, now)
                .unwrap_or_default();
            log::info!(
                "{} ({}) at ({:.1}%, {:.1}%), last watered: {}",
                pin.name,
                pin.kind,
                pin.x_percent,
                pin.y_percent,
                label
            );
        }
        log::info!("{} store calls", store.calls().len());
        session.app.teardown();
        Ok(())
    }
}

// WASM builds embed the library; there is no demo entry point.
#[cfg(target_arch = "wasm32")]
fn main() {}
