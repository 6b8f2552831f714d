use boats_core::{DrawCommand, ImageId, Renderer};
use wasm_bindgen::JsValue;
use web_sys::{CanvasRenderingContext2d, HtmlImageElement};

/// Draws sketch primitives onto a 2D canvas
pub struct CanvasRenderer {
    context: CanvasRenderingContext2d,
    images: Vec<HtmlImageElement>,
    width: f64,
    height: f64,
}

impl CanvasRenderer {
    pub fn new(context: CanvasRenderingContext2d, image_urls: &[String], width: f64, height: f64) -> Self {
        let images = image_urls
            .iter()
            .filter_map(|url| match HtmlImageElement::new() {
                Ok(image) => {
                    image.set_src(url);
                    Some(image)
                }
                Err(err) => {
                    log::warn!("could not create image for {}: {:?}", url, err);
                    None
                }
            })
            .collect();

        Self {
            context,
            images,
            width,
            height,
        }
    }

    pub fn image_ids(&self) -> Vec<ImageId> {
        (0..self.images.len()).map(ImageId).collect()
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
    }

    fn draw_triangle(&self, x: f64, y: f64, heading: f64, size: f64, fill: &str) -> Result<(), JsValue> {
        let ctx = &self.context;
        ctx.save();
        ctx.translate(x, y)?;
        ctx.rotate(heading)?;

        // Tip points up before rotation
        ctx.begin_path();
        ctx.move_to(0.0, -size * 2.0);
        ctx.line_to(-size, size * 2.0);
        ctx.line_to(size, size * 2.0);
        ctx.close_path();

        ctx.set_fill_style_str(fill);
        ctx.fill();
        ctx.set_stroke_style_str("#ffffff");
        ctx.set_line_width(1.0);
        ctx.stroke();

        ctx.restore();
        Ok(())
    }

    fn draw_sprite(&self, x: f64, y: f64, size: f64, image: ImageId, flipped: bool) -> Result<(), JsValue> {
        let Some(bitmap) = self.images.get(image.0) else {
            return Ok(());
        };
        // Still loading
        if !bitmap.complete() {
            return Ok(());
        }

        let ctx = &self.context;
        ctx.save();
        ctx.translate(x, y)?;
        if flipped {
            ctx.scale(-1.0, 1.0)?;
        }
        ctx.draw_image_with_html_image_element_and_dw_and_dh(bitmap, -size / 2.0, -size / 2.0, size, size)?;
        ctx.restore();
        Ok(())
    }
}

impl Renderer for CanvasRenderer {
    fn clear(&mut self) {
        self.context.set_fill_style_str("#000000");
        self.context.fill_rect(0.0, 0.0, self.width, self.height);
    }

    fn draw(&mut self, command: &DrawCommand) {
        let result = match *command {
            DrawCommand::Triangle {
                position,
                heading,
                size,
                hue,
            } => self.draw_triangle(
                position.x as f64,
                position.y as f64,
                heading as f64,
                size as f64,
                &hue.css(),
            ),
            DrawCommand::Sprite {
                position,
                size,
                image,
                flipped,
            } => self.draw_sprite(position.x as f64, position.y as f64, size as f64, image, flipped),
        };

        if let Err(err) = result {
            // Canvas state is unbalanced after a failed transform
            self.context.restore();
            log::warn!("draw failed: {:?}", err);
        }
    }
}
