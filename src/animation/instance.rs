//! 动画实例与实例池
//!
//! 实例池由槽位组成，空槽位可被复用。每个槽位带有代数计数，
//! 销毁时递增，因此旧句柄不会误指向复用该槽位的新实例。

use std::fmt;

/// 动画实例句柄
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceHandle {
    index: u32,
    generation: u32,
}

impl InstanceHandle {
    /// 槽位下标
    pub fn index(&self) -> usize {
        self.index as usize
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for InstanceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InstanceHandle({}v{})", self.index, self.generation)
    }
}

/// 正在播放的动画片段引用
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationInstance {
    /// 动画片段 ID
    pub clip_id: usize,
    /// 当前播放时间 (秒)
    pub cursor: f32,
    /// 速度倍率，可为负（倒放）
    pub speed: f32,
    /// 暂停时 `advance` 不推进游标
    pub paused: bool,
    /// 求值时游标被钳制到片段末尾后置位，游标回到片段内后的下一次求值清除
    pub finished: bool,
}

impl AnimationInstance {
    pub fn new(clip_id: usize, speed: f32, start_offset: f32) -> Self {
        Self {
            clip_id,
            cursor: start_offset,
            speed,
            paused: false,
            finished: false,
        }
    }

    /// 按帧间隔推进游标，不做钳制
    pub fn advance(&mut self, dt: f32) {
        if !self.paused {
            self.cursor += dt * self.speed;
        }
    }
}

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    instance: Option<AnimationInstance>,
}

/// 动画实例池
#[derive(Debug, Default)]
pub struct InstancePool {
    slots: Vec<Slot>,
}

impl InstancePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// 放入实例，优先复用第一个空槽位
    pub fn insert(&mut self, instance: AnimationInstance) -> InstanceHandle {
        let index = match self.slots.iter().position(|slot| slot.instance.is_none()) {
            Some(index) => index,
            None => {
                self.slots.push(Slot::default());
                self.slots.len() - 1
            }
        };

        let slot = &mut self.slots[index];
        slot.instance = Some(instance);
        InstanceHandle {
            index: index as u32,
            generation: slot.generation,
        }
    }

    /// 移除实例；句柄无效时返回 None
    pub fn remove(&mut self, handle: InstanceHandle) -> Option<AnimationInstance> {
        let slot = self.slot_mut(handle)?;
        let instance = slot.instance.take();
        slot.generation = slot.generation.wrapping_add(1);
        instance
    }

    pub fn get(&self, handle: InstanceHandle) -> Option<&AnimationInstance> {
        self.slots
            .get(handle.index())
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.instance.as_ref())
    }

    pub fn get_mut(&mut self, handle: InstanceHandle) -> Option<&mut AnimationInstance> {
        self.slot_mut(handle)?.instance.as_mut()
    }

    pub fn contains(&self, handle: InstanceHandle) -> bool {
        self.get(handle).is_some()
    }

    /// 所有存活实例
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut AnimationInstance> {
        self.slots.iter_mut().filter_map(|slot| slot.instance.as_mut())
    }

    /// 存活实例数量
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.instance.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 槽位总数（含空槽位）
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// 清空所有实例；槽位与代数保留，旧句柄全部失效
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            if slot.instance.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
            }
        }
    }

    fn slot_mut(&mut self, handle: InstanceHandle) -> Option<&mut Slot> {
        self.slots
            .get_mut(handle.index())
            .filter(|slot| slot.generation == handle.generation && slot.instance.is_some())
    }
}
