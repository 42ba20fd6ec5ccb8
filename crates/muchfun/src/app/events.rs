//! winit event handling.

use super::loops::{logic, render};
use super::App;
use crate::window_context::WindowContext;
use std::time::{Duration, Instant};
use tracing::{error, info};
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow};
use winit::window::WindowId;

/// UI refresh and output tick interval (~60 Hz). The mixer rate-limits sends.
const FRAME_INTERVAL: Duration = Duration::from_millis(16);

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        match WindowContext::new(event_loop, "MuchFun") {
            Ok(window) => {
                muchfun_ui::theme::apply(window.egui_context());
                self.window = Some(window);
                info!("--- Entering Main Event Loop ---");
            }
            Err(e) => {
                error!("Failed to create main window: {:#}", e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let Some(window) = self.window.as_mut() else {
            return;
        };
        let repaint = window.on_window_event(&event);

        match event {
            WindowEvent::CloseRequested => {
                info!("Close requested");
                self.shutdown();
                event_loop.exit();
            }
            WindowEvent::Resized(size) => window.resize(size),
            WindowEvent::RedrawRequested => {
                if let Err(e) = render::render(self) {
                    error!("Render error: {:#}", e);
                }
            }
            _ => {
                if repaint {
                    window.window.request_redraw();
                }
            }
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();
        if now >= self.next_frame {
            logic::update(self);
            if let Some(window) = &self.window {
                window.window.request_redraw();
            }
            self.next_frame = now + FRAME_INTERVAL;
        }
        event_loop.set_control_flow(ControlFlow::WaitUntil(self.next_frame));
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.shutdown();
    }
}
