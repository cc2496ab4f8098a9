use image::{Rgb, RgbImage};
use imageproc::{drawing::draw_filled_rect_mut, rect::Rect};

use crate::types::Region;

/// Paint every region's outline rectangles onto `canvas`, in the given order.
pub fn draw_regions(canvas: &mut RgbImage, regions: &[Region], color: Rgb<u8>) {
    for region in regions {
        for cell in &region.outline {
            let rect = Rect::at(cell.x as i32, cell.y as i32).of_size(cell.width, cell.height);
            draw_filled_rect_mut(canvas, rect, color);
        }
    }
}
