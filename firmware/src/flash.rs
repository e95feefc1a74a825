//! Settings and memory chunks kept in the last kilobyte of flash
//!
//! The part has no EEPROM. Writes go page by page through the 64-byte
//! fast erase/program path: read the page, patch it, erase it, program it.

use bluebox_core::memory::{SENTINEL, STORE_LEN};
use bluebox_core::{HalError, Storage};

const FLASH_BASE: u32 = 0x4002_2000;
const FLASH_KEYR: u32 = 0x04;
const FLASH_STATR: u32 = 0x0C;
const FLASH_CTLR: u32 = 0x10;
const FLASH_ADDR: u32 = 0x14;
const FLASH_MODEKEYR: u32 = 0x24;

const KEY1: u32 = 0x4567_0123;
const KEY2: u32 = 0xCDEF_89AB;

const STATR_BSY: u32 = 1 << 0;
const STATR_WRPRTERR: u32 = 1 << 4;
const CTLR_STRT: u32 = 1 << 6;
const CTLR_LOCK: u32 = 1 << 7;
const CTLR_FLOCK: u32 = 1 << 15;
const CTLR_FTPG: u32 = 1 << 16;
const CTLR_FTER: u32 = 1 << 17;
const CTLR_BUFLOAD: u32 = 1 << 18;
const CTLR_BUFRST: u32 = 1 << 19;

/// Matches the `STORE` region in memory.x
const STORE_BASE: u32 = 0x0800_3C00;
const PAGE_SIZE: usize = 64;

/// What an erased word reads back as on this part
const ERASED: [u8; 4] = [0x39, 0xE3, 0x39, 0xE3];

const BUSY_LIMIT: u32 = 100_000;

pub struct FlashStore {
    _private: (),
}

impl FlashStore {
    pub fn new() -> Self {
        Self { _private: () }
    }

    /// Fill a never-written store with the empty marker so slots decode as empty
    pub fn prepare(&mut self) -> Result<(), HalError> {
        let blank = (0..STORE_LEN).all(|i| read_byte(i) == ERASED[i % ERASED.len()]);
        if blank {
            info!("formatting settings store");
            let page = [SENTINEL; PAGE_SIZE];
            let mut address = 0;
            while address < STORE_LEN {
                let len = PAGE_SIZE.min(STORE_LEN - address);
                self.write(address as u16, &page[..len])?;
                address += len;
            }
        }
        Ok(())
    }
}

fn read_byte(offset: usize) -> u8 {
    unsafe { core::ptr::read_volatile((STORE_BASE as usize + offset) as *const u8) }
}

fn check_range(address: u16, len: usize) -> Result<usize, HalError> {
    let start = address as usize;
    match start.checked_add(len) {
        Some(end) if end <= STORE_LEN => Ok(start),
        _ => Err(HalError::AddressOutOfRange),
    }
}

impl Storage for FlashStore {
    fn read(&mut self, address: u16, buf: &mut [u8]) -> Result<(), HalError> {
        let start = check_range(address, buf.len())?;
        for (i, byte) in buf.iter_mut().enumerate() {
            *byte = read_byte(start + i);
        }
        Ok(())
    }

    fn write(&mut self, address: u16, data: &[u8]) -> Result<(), HalError> {
        let start = check_range(address, data.len())?;
        let mut done = 0;
        while done < data.len() {
            let offset = start + done;
            let page_start = offset - offset % PAGE_SIZE;
            let in_page = offset - page_start;
            let len = (PAGE_SIZE - in_page).min(data.len() - done);

            let mut image = [0u8; PAGE_SIZE];
            for (i, byte) in image.iter_mut().enumerate() {
                *byte = read_byte(page_start + i);
            }
            let chunk = &data[done..done + len];
            if image[in_page..in_page + len] != *chunk {
                image[in_page..in_page + len].copy_from_slice(chunk);
                let page_address = STORE_BASE + page_start as u32;
                critical_section::with(|_| unsafe { rewrite_page(page_address, &image) })?;
                if (0..len).any(|i| read_byte(offset + i) != chunk[i]) {
                    warn!("flash verify failed at {}", offset);
                    return Err(HalError::StorageError);
                }
            }
            done += len;
        }
        Ok(())
    }
}

unsafe fn read_ctlr() -> u32 {
    core::ptr::read_volatile((FLASH_BASE + FLASH_CTLR) as *const u32)
}

unsafe fn write_ctlr(value: u32) {
    core::ptr::write_volatile((FLASH_BASE + FLASH_CTLR) as *mut u32, value)
}

unsafe fn wait_idle() -> Result<(), HalError> {
    let statr = (FLASH_BASE + FLASH_STATR) as *mut u32;
    let mut spins = 0;
    while core::ptr::read_volatile(statr) & STATR_BSY != 0 {
        spins += 1;
        if spins >= BUSY_LIMIT {
            return Err(HalError::StorageError);
        }
    }
    let status = core::ptr::read_volatile(statr);
    if status & STATR_WRPRTERR != 0 {
        core::ptr::write_volatile(statr, STATR_WRPRTERR);
        return Err(HalError::StorageError);
    }
    Ok(())
}

unsafe fn unlock() {
    let keyr = (FLASH_BASE + FLASH_KEYR) as *mut u32;
    let modekeyr = (FLASH_BASE + FLASH_MODEKEYR) as *mut u32;
    if read_ctlr() & CTLR_LOCK != 0 {
        core::ptr::write_volatile(keyr, KEY1);
        core::ptr::write_volatile(keyr, KEY2);
    }
    if read_ctlr() & CTLR_FLOCK != 0 {
        core::ptr::write_volatile(modekeyr, KEY1);
        core::ptr::write_volatile(modekeyr, KEY2);
    }
}

unsafe fn lock() {
    write_ctlr(read_ctlr() | CTLR_LOCK | CTLR_FLOCK);
}

/// Erase and program one 64-byte page; caller holds the critical section
unsafe fn rewrite_page(page_address: u32, image: &[u8; PAGE_SIZE]) -> Result<(), HalError> {
    unlock();
    let result = erase_page(page_address).and_then(|_| program_page(page_address, image));
    write_ctlr(read_ctlr() & !(CTLR_FTER | CTLR_FTPG));
    lock();
    result
}

unsafe fn erase_page(page_address: u32) -> Result<(), HalError> {
    write_ctlr(read_ctlr() | CTLR_FTER);
    core::ptr::write_volatile((FLASH_BASE + FLASH_ADDR) as *mut u32, page_address);
    write_ctlr(read_ctlr() | CTLR_STRT);
    wait_idle()?;
    write_ctlr(read_ctlr() & !CTLR_FTER);
    Ok(())
}

unsafe fn program_page(page_address: u32, image: &[u8; PAGE_SIZE]) -> Result<(), HalError> {
    write_ctlr(read_ctlr() | CTLR_FTPG);
    write_ctlr(read_ctlr() | CTLR_BUFRST);
    wait_idle()?;

    for (i, word) in image.chunks_exact(4).enumerate() {
        let value = u32::from_le_bytes([word[0], word[1], word[2], word[3]]);
        core::ptr::write_volatile((page_address + 4 * i as u32) as *mut u32, value);
        write_ctlr(read_ctlr() | CTLR_BUFLOAD);
        wait_idle()?;
    }

    core::ptr::write_volatile((FLASH_BASE + FLASH_ADDR) as *mut u32, page_address);
    write_ctlr(read_ctlr() | CTLR_STRT);
    wait_idle()?;
    write_ctlr(read_ctlr() & !CTLR_FTPG);
    Ok(())
}
