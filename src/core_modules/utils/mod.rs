pub mod image_helper;

#[cfg(test)]
pub mod test_frames;
