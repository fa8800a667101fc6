use vello_cpu::kurbo::Shape as _;

use crate::foundation::core::{Canvas, Point};
use crate::foundation::error::{CollatzError, CollatzResult};
use crate::render::composite::{fill, over_in_place};
use crate::render::frame::FrameRGBA;
use crate::render::viewport::Viewport;
use crate::render::TreeStyle;
use crate::tree::{PlotLimits, Segment};

/// CPU rasterizer that accumulates tree segments on a fixed camera frame.
///
/// Each call to [`TreeRasterizer::draw_segments`] strokes its batch into a scratch layer with
/// `vello_cpu`, then composites that layer over everything drawn so far.
pub struct TreeRasterizer {
    width: u16,
    height: u16,
    viewport: Viewport,
    style: TreeStyle,
    accum: Vec<u8>,
    layer: vello_cpu::Pixmap,
    segments_drawn: u64,
}

impl TreeRasterizer {
    /// New canvas cleared to the style background.
    pub fn new(canvas: Canvas, limits: &PlotLimits, style: TreeStyle) -> CollatzResult<Self> {
        canvas.validate()?;
        style.validate()?;
        let width: u16 = canvas
            .width
            .try_into()
            .map_err(|_| CollatzError::render("canvas width exceeds u16"))?;
        let height: u16 = canvas
            .height
            .try_into()
            .map_err(|_| CollatzError::render("canvas height exceeds u16"))?;

        let mut accum = vec![0u8; canvas.width as usize * canvas.height as usize * 4];
        fill(&mut accum, style.background.premul().to_array());

        let viewport = Viewport::fit(limits, canvas);
        tracing::debug!(
            width,
            height,
            px_per_unit = viewport.scale(),
            "tree rasterizer ready"
        );

        Ok(Self {
            width,
            height,
            viewport,
            style,
            accum,
            layer: vello_cpu::Pixmap::new(width, height),
            segments_drawn: 0,
        })
    }

    /// World-to-pixel mapping in use.
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Non-degenerate segments stroked so far.
    pub fn segments_drawn(&self) -> u64 {
        self.segments_drawn
    }

    /// Paint the start marker: a dot of `marker_size` pixels at the world origin.
    pub fn draw_origin(&mut self) -> CollatzResult<()> {
        if self.style.marker_size <= 0.0 {
            return Ok(());
        }
        let center = point_to_cpu(self.viewport.to_pixel(Point::ORIGIN));
        let dot = vello_cpu::kurbo::Circle::new(center, 0.5 * self.style.marker_size);

        let mut ctx = self.context();
        ctx.fill_path(&dot.to_path(0.1));
        self.composite(ctx)
    }

    /// Stroke every non-degenerate segment of `segments`; returns how many were drawn.
    pub fn draw_segments<'a>(
        &mut self,
        segments: impl IntoIterator<Item = &'a Segment>,
    ) -> CollatzResult<usize> {
        let mut ctx = self.context();
        ctx.set_stroke(vello_cpu::kurbo::Stroke::new(self.style.line_width));

        let mut drawn = 0usize;
        for seg in segments {
            if seg.is_degenerate() {
                continue;
            }
            let mut path = vello_cpu::kurbo::BezPath::new();
            path.move_to(point_to_cpu(self.viewport.to_pixel(seg.from)));
            path.line_to(point_to_cpu(self.viewport.to_pixel(seg.to)));
            ctx.stroke_path(&path);
            drawn += 1;
        }

        if drawn > 0 {
            self.composite(ctx)?;
            self.segments_drawn += drawn as u64;
        }
        Ok(drawn)
    }

    /// Copy of the current canvas.
    pub fn snapshot(&self) -> FrameRGBA {
        FrameRGBA {
            width: u32::from(self.width),
            height: u32::from(self.height),
            data: self.accum.clone(),
            premultiplied: true,
        }
    }

    fn context(&self) -> vello_cpu::RenderContext {
        let mut ctx = vello_cpu::RenderContext::new(self.width, self.height);
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        let c = self.style.color.with_opacity(self.style.alpha);
        ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a));
        ctx
    }

    fn composite(&mut self, mut ctx: vello_cpu::RenderContext) -> CollatzResult<()> {
        fill(self.layer.data_as_u8_slice_mut(), [0, 0, 0, 0]);
        ctx.flush();
        ctx.render_to_pixmap(&mut self.layer);
        over_in_place(&mut self.accum, self.layer.data_as_u8_slice())
    }
}

fn point_to_cpu(p: Point) -> vello_cpu::kurbo::Point {
    vello_cpu::kurbo::Point::new(p.x, p.y)
}
