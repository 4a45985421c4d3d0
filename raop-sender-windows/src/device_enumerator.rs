//! Default render endpoint lookup via the MMDevice API.

use windows::Win32::Devices::FunctionDiscovery::*;
use windows::Win32::Media::Audio::*;
use windows::Win32::System::Com::StructuredStorage::PropVariantClear;
use windows::Win32::System::Com::*;
use windows::Win32::System::Variant::*;

use raop_sender_core::SenderError;

/// Default render (speaker/headphone) endpoint, the source of loopback audio.
///
/// Requires COM to be initialized on the calling thread.
pub(crate) fn default_render_device() -> Result<IMMDevice, SenderError> {
    unsafe {
        let enumerator: IMMDeviceEnumerator = CoCreateInstance(&MMDeviceEnumerator, None, CLSCTX_ALL)
            .map_err(|e| SenderError::DeviceUnavailable(format!("failed to create enumerator: {}", e)))?;

        enumerator
            .GetDefaultAudioEndpoint(eRender, eConsole)
            .map_err(|_| SenderError::DeviceUnavailable("no default output device".into()))
    }
}

/// Read the PKEY_Device_FriendlyName property from a device.
pub(crate) fn friendly_name(device: &IMMDevice) -> Option<String> {
    unsafe {
        let store = device.OpenPropertyStore(STGM_READ).ok()?;

        let mut prop_variant = store.GetValue(&PKEY_Device_FriendlyName).ok()?;

        let name = if prop_variant.Anonymous.Anonymous.vt == VT_LPWSTR {
            let pwsz = prop_variant.Anonymous.Anonymous.Anonymous.pwszVal;
            if !pwsz.is_null() {
                let len = (0..).take_while(|&i| *pwsz.offset(i) != 0).count();
                Some(String::from_utf16_lossy(std::slice::from_raw_parts(pwsz, len)))
            } else {
                None
            }
        } else {
            None
        };

        PropVariantClear(&mut prop_variant).ok();
        name
    }
}
