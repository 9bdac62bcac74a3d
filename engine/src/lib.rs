use anyhow::Result;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, Event, KeyEvent, WindowEvent};
use winit::event_loop::EventLoop;
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowBuilder};

use renderer::Renderer;

pub mod renderer;
pub mod vulkan;

pub struct Engine {
    window: Window,
    renderer: Renderer,
    event_loop: EventLoop<()>,
}

impl Engine {
    pub fn new() -> Result<Engine> {
        // Window
        let event_loop = EventLoop::new()?;
        let window = WindowBuilder::new()
            .with_title("Borealis")
            .with_inner_size(LogicalSize::new(800, 600))
            .build(&event_loop)?;

        // Diagnostics follow the build profile unless a caller decides
        // otherwise through `Renderer::create`.
        let renderer = unsafe { Renderer::create(&window, cfg!(debug_assertions))? };

        Ok(Engine {
            window,
            renderer,
            event_loop,
        })
    }

    pub fn run(self) -> Result<()> {
        let window = self.window;
        let renderer = self.renderer;

        self.event_loop.run(move |event, elwt| match event {
            Event::AboutToWait => window.request_redraw(),
            Event::WindowEvent { event, .. } => match event {
                WindowEvent::CloseRequested => {
                    // Let the driver finish before the handle chain is
                    // released in reverse order.
                    unsafe { renderer.context.device_wait_idle() }.ok();
                    elwt.exit();
                }
                WindowEvent::KeyboardInput {
                    event:
                        KeyEvent {
                            logical_key: Key::Named(NamedKey::Escape),
                            state: ElementState::Pressed,
                            ..
                        },
                    ..
                } => {
                    unsafe { renderer.context.device_wait_idle() }.ok();
                    elwt.exit();
                }
                _ => {}
            },
            _ => {}
        })?;

        Ok(())
    }
}
