use std::io::{self, Write};

use sift_core::Keypoint;

/// Values per full descriptor line; the remainder goes on a final short line
const LINE_WIDTH: usize = 20;

/// Write keypoints and raw (unnormalized) descriptors in the dataset format
/// read by [`crate::KeyFileLoader`].
pub fn write_key_file<W: Write, D: AsRef<[f32]>>(out: &mut W, keypoints: &[Keypoint], descriptors: &[D]) -> io::Result<()> {
    if keypoints.len() != descriptors.len() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} keypoints but {} descriptors", keypoints.len(), descriptors.len()),
        ));
    }
    let length = descriptors.first().map_or(sift_core::DESCRIPTOR_LEN, |d| d.as_ref().len());
    writeln!(out, "{} {}", keypoints.len(), length)?;
    for (kp, desc) in keypoints.iter().zip(descriptors) {
        writeln!(out, "{} {} {} {}", kp.row, kp.col, kp.scale, kp.orientation)?;
        for chunk in desc.as_ref().chunks(LINE_WIDTH) {
            let line = chunk.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(" ");
            writeln!(out, " {}", line)?;
        }
    }
    Ok(())
}
