use crate::capture::error::{CaptureError, Result};

/// One RGB frame as delivered by a capture device.
///
/// Pixels are tightly packed 8-bit RGB, row-major, `width * height * 3`
/// bytes. The buffer is owned so the engine can rotate and annotate it in
/// place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl Frame {
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Self {
        debug_assert_eq!(data.len(), (width * height * 3) as usize);
        Self {
            width,
            height,
            data,
        }
    }

    /// A black frame of the given size.
    pub fn blank(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; (width * height * 3) as usize],
        }
    }
}

/// Device controls the engine knows how to forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureControl {
    Brightness,
    Contrast,
}

impl CaptureControl {
    /// Parses the property name carried by the `set_property` command.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "brightness" => Some(CaptureControl::Brightness),
            "contrast" => Some(CaptureControl::Contrast),
            _ => None,
        }
    }
}

/// Factory for opened capture devices.
///
/// The engine owns one backend for its whole lifetime and opens devices
/// through it whenever the active camera changes or a broken session is
/// rebuilt.
pub trait CaptureBackend: Send {
    /// Open device `index` at the requested resolution.
    ///
    /// The device may negotiate a different resolution; callers must read it
    /// back via [`CaptureDevice::dimensions`]. Zero-sized negotiations are
    /// rejected here with [`CaptureError::InvalidResolution`].
    fn open(&self, index: u32, width: u32, height: u32) -> Result<Box<dyn CaptureDevice>>;
}

/// An opened, streaming capture device.
pub trait CaptureDevice: Send {
    /// The resolution the device actually negotiated.
    fn dimensions(&self) -> (u32, u32);

    /// Blocks until the next frame is available.
    fn read_frame(&mut self) -> Result<Frame>;

    /// Write a device control value.
    fn set_control(&mut self, control: CaptureControl, value: i32) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedDevice {
        width: u32,
        height: u32,
    }

    impl CaptureDevice for FixedDevice {
        fn dimensions(&self) -> (u32, u32) {
            (self.width, self.height)
        }

        fn read_frame(&mut self) -> Result<Frame> {
            Ok(Frame::blank(self.width, self.height))
        }

        fn set_control(&mut self, _control: CaptureControl, _value: i32) -> Result<()> {
            Err(CaptureError::ControlWrite("unsupported".to_string()))
        }
    }

    struct FixedBackend;

    impl CaptureBackend for FixedBackend {
        fn open(&self, _index: u32, width: u32, height: u32) -> Result<Box<dyn CaptureDevice>> {
            Ok(Box::new(FixedDevice { width, height }))
        }
    }

    #[test]
    fn control_names_parse() {
        assert_eq!(
            CaptureControl::from_name("brightness"),
            Some(CaptureControl::Brightness)
        );
        assert_eq!(
            CaptureControl::from_name("contrast"),
            Some(CaptureControl::Contrast)
        );
        assert_eq!(CaptureControl::from_name("saturation"), None);
    }

    #[test]
    fn frame_blank_is_sized_for_rgb() {
        let frame = Frame::blank(4, 3);
        assert_eq!(frame.data.len(), 36);
    }

    #[test]
    fn backend_trait_object_is_usable() {
        let backend: Box<dyn CaptureBackend> = Box::new(FixedBackend);
        let mut device = backend.open(0, 8, 8).unwrap();
        assert_eq!(device.dimensions(), (8, 8));
        assert!(device.read_frame().is_ok());
        assert!(device.set_control(CaptureControl::Brightness, 10).is_err());
    }

    #[test]
    fn trait_objects_are_send() {
        fn assert_send<T: Send>() {}
        assert_send::<Box<dyn CaptureBackend>>();
        assert_send::<Box<dyn CaptureDevice>>();
    }
}
