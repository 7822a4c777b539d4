// LeGuardian Bracelet - Persistent Registration Flag
//
// One byte in NVS. Falls back to RAM when the partition cannot be opened, in
// which case registration is retried on every boot.

use esp_idf_svc::nvs::{EspDefaultNvsPartition, EspNvs, NvsDefault};

use crate::capabilities::RegistrationStore;
use crate::registration::VolatileStore;

const NVS_NAMESPACE: &str = "bracelet";
const NVS_REGISTERED_KEY: &str = "registered";

pub struct NvsRegistrationStore {
    nvs: EspNvs<NvsDefault>,
    registered: bool,
}

impl NvsRegistrationStore {
    pub fn open(partition: EspDefaultNvsPartition) -> anyhow::Result<Self> {
        let nvs = EspNvs::new(partition, NVS_NAMESPACE, true)?;
        let registered = nvs.get_u8(NVS_REGISTERED_KEY)?.unwrap_or(0) != 0;
        Ok(Self { nvs, registered })
    }
}

impl RegistrationStore for NvsRegistrationStore {
    fn is_registered(&self) -> bool {
        self.registered
    }

    fn mark_registered(&mut self) -> anyhow::Result<()> {
        self.nvs.set_u8(NVS_REGISTERED_KEY, 1)?;
        self.registered = true;
        Ok(())
    }
}

pub enum Storage {
    Flash(NvsRegistrationStore),
    Ram(VolatileStore),
}

impl Storage {
    pub fn open(partition: anyhow::Result<EspDefaultNvsPartition>) -> Self {
        match partition.and_then(NvsRegistrationStore::open) {
            Ok(store) => Storage::Flash(store),
            Err(e) => {
                log::warn!("NVS unavailable ({e:#}), registration flag kept in RAM");
                Storage::Ram(VolatileStore::default())
            }
        }
    }
}

impl RegistrationStore for Storage {
    fn is_registered(&self) -> bool {
        match self {
            Storage::Flash(s) => s.is_registered(),
            Storage::Ram(s) => s.is_registered(),
        }
    }

    fn mark_registered(&mut self) -> anyhow::Result<()> {
        match self {
            Storage::Flash(s) => s.mark_registered(),
            Storage::Ram(s) => s.mark_registered(),
        }
    }
}
