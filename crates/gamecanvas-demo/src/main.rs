use std::collections::HashMap;

use anyhow::Result;
use embedded_graphics::geometry::{Point, Size};
use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Circle, PrimitiveStyle};

use gamecanvas_engine::canvas::Canvas;
use gamecanvas_engine::coords::Vec2;
use gamecanvas_engine::core::FrameDriver;
use gamecanvas_engine::device::GpuInit;
use gamecanvas_engine::entity::{InstanceId, InstanceState, Template, TemplateId, World};
use gamecanvas_engine::logging::{init_logging, LoggingConfig};
use gamecanvas_engine::paint::Color;
use gamecanvas_engine::window::{Runtime, RuntimeConfig};

const BALL_RADIUS: u32 = 6;
const MAX_BALLS: usize = 12;
const SPAWN_EVERY: u64 = 20;
/// Ticks between frame-rate switches (30 <-> 60).
const FPS_TOGGLE_EVERY: u64 = 300;

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let mut canvas = Canvas::with_default_viewport()?;
    let ball = canvas.world_mut().register(ball_template());
    canvas
        .world_mut()
        .spawn(ball, InstanceState::at(40.0, 40.0))
        .ok_or_else(|| anyhow::anyhow!("ball template vanished"))?;

    let mut driver = FrameDriver::new(canvas);
    bind_globals(&mut driver, ball);

    log::info!("starting demo, close the window to quit");
    Runtime::run(RuntimeConfig::default(), GpuInit::default(), driver)
}

fn ball_template() -> Template {
    let mut template = Template::new("ball");

    let mut velocities: HashMap<InstanceId, Vec2> = HashMap::new();
    template.bind_update(move |ctx| {
        let v = velocities
            .entry(ctx.id)
            .or_insert_with(|| initial_velocity(ctx.id));

        let vp = ctx.viewport;
        let r = BALL_RADIUS as f32;
        let (min_x, min_y) = (vp.x as f32 + r, vp.y as f32 + r);
        let (max_x, max_y) = (
            (vp.x + vp.width as i32) as f32 - r,
            (vp.y + vp.height as i32) as f32 - r,
        );

        let pos = &mut ctx.state.position;
        *pos += *v;
        if pos.x < min_x || pos.x > max_x {
            v.x = -v.x;
            pos.x = pos.x.clamp(min_x, max_x);
        }
        if pos.y < min_y || pos.y > max_y {
            v.y = -v.y;
            pos.y = pos.y.clamp(min_y, max_y);
        }
        Ok(())
    });

    template.bind_draw(|ctx| {
        let color = palette(ctx.id.index());
        let center = ctx.state.position.to_point();
        Circle::with_center(center, BALL_RADIUS * 2 + 1)
            .into_styled(PrimitiveStyle::with_fill(Rgb888::from(color)))
            .draw(&mut ctx.canvas)?;
        Ok(())
    });

    template
}

fn bind_globals(driver: &mut FrameDriver, ball: TemplateId) {
    driver.on_update(move |ctx| {
        let frame = ctx.time.frame_index;

        if frame > 0 && frame % SPAWN_EVERY == 0 && ctx.world.instances_of(ball).len() < MAX_BALLS {
            let (w, h) = ctx.viewport.size();
            let x = ctx.viewport.x as f32 + (frame * 37 % w as u64) as f32;
            let y = ctx.viewport.y as f32 + (frame * 53 % h as u64) as f32;
            spawn_ball(ctx.world, ball, InstanceState::at(x, y));
        }

        if frame > 0 && frame % FPS_TOGGLE_EVERY == 0 {
            let next = if ctx.settings.fps() == 30 { 60 } else { 30 };
            ctx.settings.set_fps(next)?;
            log::info!("switching to {next} fps");
        }
        Ok(())
    });

    driver.on_draw(|ctx| {
        let label = format!("balls: {}", ctx.world.instance_count());
        let at = Point::new(ctx.viewport.x + 4, ctx.viewport.y + 4);
        ctx.canvas.draw_text(&label, at, Color::BLACK);
        Ok(())
    });

    driver.on_draw_overlay(|ctx| {
        let (w, h) = ctx.canvas.size();
        ctx.canvas
            .draw_line(Point::zero(), Point::new(w as i32 - 1, h as i32 - 1), Color::RED, 1);

        let label = format!("frame {} @ {} fps", ctx.time.frame_index, ctx.settings.fps());
        let y = h as i32 - 14;
        ctx.canvas.fill_rect(Point::new(0, y), Size::new(w, 14), Color::rgba(0, 0, 0, 160));
        ctx.canvas.draw_text(&label, Point::new(4, y + 2), Color::WHITE);
        Ok(())
    });
}

/// Spawns a ball, warning instead of failing the tick if the template is gone.
fn spawn_ball(world: &mut World, ball: TemplateId, state: InstanceState) -> bool {
    let spawned = world.spawn(ball, state).is_some();
    if !spawned {
        log::warn!("ball template is no longer registered; skipping spawn");
    }
    spawned
}

fn initial_velocity(id: InstanceId) -> Vec2 {
    let i = id.index() as f32;
    Vec2::new(1.5 + (i * 0.7) % 2.0, 1.0 + (i * 1.3) % 1.5)
}

fn palette(index: u32) -> Color {
    const COLORS: [Color; 5] = [
        Color::RED,
        Color::BLUE,
        Color::GREEN,
        Color::rgb(255, 165, 0),
        Color::rgb(128, 0, 128),
    ];
    COLORS[index as usize % COLORS.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawn_into_unregistered_template_is_skipped() {
        let mut world = World::new();
        let ball = world.register(ball_template());
        assert!(spawn_ball(&mut world, ball, InstanceState::at(1.0, 1.0)));

        world.unregister(ball);
        assert!(!spawn_ball(&mut world, ball, InstanceState::at(2.0, 2.0)));
        assert_eq!(world.instance_count(), 0);
    }
}
